//! # HPG 串口会话层
//!
//! 本模块提供串口连接的生命周期管理与响应日志落盘：
//! - 会话监督线程（[`SerialSession`]）：断线重连、持续接收、发送
//! - 变更检测日志（[`ChangeLogSink`]）：按通道去重后追加落盘
//!
//! # 并发模型
//!
//! 每个会话一个后台监督线程 + 一个交互线程，共两个逻辑任务：
//! - 监督线程独占串口读半部，负责重连策略与行转发
//! - 交互线程通过 [`SerialSession::transmit`] 发送、
//!   [`SerialSession::is_connected`] 查询状态（原子读，无阻塞）
//!
//! 命令与响应之间**没有**关联关系：发送即忘，收到的下一行未必是
//! 上一条命令的应答。上层不得依赖任何配对假设。

mod error;
mod session;
mod sink;

pub use error::SessionError;
pub use session::{SerialSession, SessionConfig};
pub use sink::{ChangeLogSink, PersistError, ResponseSink};
