//! Mock 串口后端（无硬件测试）
//!
//! 通过共享句柄在测试中脚本化一条"串口链路"：
//! - 控制 `open` 成败（重连路径测试）
//! - 注入接收行 / 接收故障（接收循环测试）
//! - 捕获发送字节 / 注入发送故障（transmit 路径测试）
//!
//! 故障注入为一次性：触发一次后自动清除，便于验证"故障 -> 断开 -> 重连"。

use crate::{SerialError, SerialOpen, SerialRx, SerialTx};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct MockState {
    fail_connect: bool,
    open_count: u32,
    rx_lines: VecDeque<String>,
    rx_fault: bool,
    tx_fault: bool,
    written: Vec<Vec<u8>>,
}

/// Mock 后端（实现 [`SerialOpen`]）
#[derive(Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取控制句柄（可随意克隆，跨线程使用）
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: self.state.clone(),
        }
    }
}

impl SerialOpen for MockBackend {
    fn open(
        &self,
        port: &str,
        _baud_rate: u32,
        _timeout: Duration,
    ) -> Result<(Box<dyn SerialRx>, Box<dyn SerialTx>), SerialError> {
        let mut state = self.state.lock();
        state.open_count += 1;
        if state.fail_connect {
            return Err(SerialError::Open {
                port: port.to_string(),
                message: "mock connect failure".to_string(),
            });
        }
        Ok((
            Box::new(MockRx {
                state: self.state.clone(),
            }),
            Box::new(MockTx {
                state: self.state.clone(),
            }),
        ))
    }
}

/// Mock 控制句柄
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// 控制后续 `open` 调用成败
    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// `open` 被调用的次数
    pub fn open_count(&self) -> u32 {
        self.state.lock().open_count
    }

    /// 注入一行接收数据
    pub fn push_line(&self, line: &str) {
        self.state.lock().rx_lines.push_back(line.to_string());
    }

    /// 尚未被读取的行数
    pub fn pending_lines(&self) -> usize {
        self.state.lock().rx_lines.len()
    }

    /// 注入一次接收故障（下一次 `read_line` 返回 Err）
    pub fn inject_rx_fault(&self) {
        self.state.lock().rx_fault = true;
    }

    /// 注入一次发送故障（下一次 `write_all` 返回 Err）
    pub fn inject_tx_fault(&self) {
        self.state.lock().tx_fault = true;
    }

    /// 已发送内容（UTF-8 解码）
    pub fn written(&self) -> Vec<String> {
        self.state
            .lock()
            .written
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }
}

struct MockRx {
    state: Arc<Mutex<MockState>>,
}

impl SerialRx for MockRx {
    fn read_line(&mut self) -> Result<Option<String>, SerialError> {
        let mut state = self.state.lock();
        if state.rx_fault {
            state.rx_fault = false;
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock rx fault",
            )));
        }
        Ok(state.rx_lines.pop_front())
    }
}

struct MockTx {
    state: Arc<Mutex<MockState>>,
}

impl SerialTx for MockTx {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut state = self.state.lock();
        if state.tx_fault {
            state.tx_fault = false;
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock tx fault",
            )));
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }
}
