//! 会话层错误类型定义

use hpgat_serial::SerialError;
use thiserror::Error;

/// 会话层错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 未连接（发送前先看 `is_connected()`；监督线程会持续重连）
    #[error("Serial session not connected")]
    NotConnected,

    /// 发送失败（连接状态已切回 Disconnected，重连后可重试）
    #[error("Transmit failed: {0}")]
    Transmit(#[source] SerialError),

    /// 底层串口错误
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),
}
