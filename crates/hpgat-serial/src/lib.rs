//! # HPG 串口适配层
//!
//! 串口硬件抽象：统一的打开 / 接收 / 发送接口。
//!
//! 读写两半分离（[`SerialRx`] / [`SerialTx`]），接收循环独占读半部，
//! 交互线程通过写半部发送，互不阻塞。超时不是错误：
//! `read_line()` 超时返回 `Ok(None)`，与"没有数据"等价，不触发状态变更。

use std::time::Duration;
use thiserror::Error;

pub mod mock;
mod port;

pub use port::UartBackend;

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    /// 打开串口失败
    #[error("Cannot open serial port `{port}`: {message}")]
    Open {
        /// 串口路径（如 /dev/ttyUSB0）
        port: String,
        /// 底层错误描述
        message: String,
    },

    /// 传输 IO 错误（读/写失败，连接视为断开）
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// 串口读半部
///
/// 由接收循环独占持有。
pub trait SerialRx: Send {
    /// 读取一行（行结束符已剥离）
    ///
    /// # 返回
    /// - `Ok(Some(line))`: 读到完整一行
    /// - `Ok(None)`: 超时，无完整行（已读到的半行保留到下次调用）
    /// - `Err(_)`: 传输故障，连接应视为断开
    fn read_line(&mut self) -> Result<Option<String>, SerialError>;
}

/// 串口写半部
///
/// 可与读半部并发使用。
pub trait SerialTx: Send {
    /// 写出全部字节
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError>;
}

/// 串口后端：打开物理（或模拟）连接
///
/// 每次 `open` 产生一对全新的读/写半部；重连即丢弃旧句柄重新 `open`。
pub trait SerialOpen: Send + Sync {
    /// 打开串口，返回 (读半部, 写半部)
    ///
    /// # 参数
    /// - `port`: 串口路径
    /// - `baud_rate`: 波特率（如 115200）
    /// - `timeout`: 读超时（同时作为打开超时）
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<(Box<dyn SerialRx>, Box<dyn SerialTx>), SerialError>;
}
