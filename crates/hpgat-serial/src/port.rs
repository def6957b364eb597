//! UART 后端（`serialport` crate）
//!
//! 8N1，波特率与读超时来自会话配置。句柄通过 `try_clone` 分离出写半部，
//! 读半部在原句柄上做增量行组装：超时返回 `Ok(None)`，半行数据跨调用保留。

use crate::{SerialError, SerialOpen, SerialRx, SerialTx};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::Duration;
use tracing::trace;

/// 物理 UART 后端
#[derive(Debug, Default)]
pub struct UartBackend;

impl UartBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SerialOpen for UartBackend {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<(Box<dyn SerialRx>, Box<dyn SerialTx>), SerialError> {
        let reader = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| SerialError::Open {
                port: port.to_string(),
                message: e.to_string(),
            })?;

        let writer = reader.try_clone().map_err(|e| SerialError::Open {
            port: port.to_string(),
            message: format!("cannot clone handle for TX: {e}"),
        })?;

        trace!(port, baud_rate, ?timeout, "serial port opened");

        Ok((
            Box::new(UartRx {
                port: reader,
                pending: Vec::new(),
            }),
            Box::new(UartTx { port: writer }),
        ))
    }
}

/// UART 读半部：增量行组装
struct UartRx {
    port: Box<dyn SerialPort>,
    /// 已收到但尚未凑满一行的字节
    pending: Vec<u8>,
}

impl UartRx {
    /// 从 pending 中切出第一行（含 `\n`），剥离行结束符
    fn take_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        // 剥离 \n 以及可选的 \r
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl SerialRx for UartRx {
    fn read_line(&mut self) -> Result<Option<String>, SerialError> {
        // 上一次读取可能已经缓存了多行
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let mut chunk = [0u8; 256];
        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    // 超时等同于无数据，半行保留待续
                    return Ok(None);
                }
                Err(e) => return Err(SerialError::Io(e)),
            }
        }
    }
}

/// UART 写半部
struct UartTx {
    port: Box<dyn SerialPort>,
}

impl SerialTx for UartTx {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        use std::io::Write;
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}
