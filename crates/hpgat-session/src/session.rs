//! 串口会话监督
//!
//! 每个会话一条长驻监督线程，集中处理重连策略并保证单一读者：
//!
//! 1. `Disconnected`：按配置的波特率/超时尝试打开串口；成功置
//!    `Connected` 并交出写半部，失败保持 `Disconnected`
//! 2. `Connected`：带超时地读一行；非空行连同通道名转发给 sink
//!    （落盘失败只记日志）；读故障丢弃句柄、退回 `Disconnected`
//! 3. 固定间隔休眠后重复（默认 1 s；读本身已阻塞到配置超时，
//!    该间隔实际决定重连节奏）
//!
//! 连接状态用原子布尔共享，交互线程随时可查；发送走写半部，
//! 与读循环互不阻塞。线程由 `shutdown()` 协作式停止，`Drop` 兜底。

use crate::error::SessionError;
use crate::sink::ResponseSink;
use hpgat_serial::{SerialOpen, SerialTx};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 会话配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 串口路径（如 /dev/ttyUSB0）
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 读/打开超时
    pub timeout: Duration,
    /// 监督循环的迭代间隔（重连节奏；测试中可缩小）
    pub retry_interval: Duration,
}

impl SessionConfig {
    /// 常规配置：1 s 重连节奏
    pub fn new(port: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timeout,
            retry_interval: Duration::from_secs(1),
        }
    }
}

/// 监督线程与交互线程共享的状态
struct SessionShared {
    description: String,
    config: SessionConfig,
    /// 连接状态（监督线程写，交互线程读）
    connected: AtomicBool,
    /// 运行标志（清除后监督线程在下一迭代退出）
    running: AtomicBool,
    /// 写半部（发送路径；断开时为 None）
    tx: Mutex<Option<Box<dyn SerialTx>>>,
}

/// 串口会话
///
/// 一个实例独占一个物理串口。创建即启动监督线程，销毁时协作停止。
///
/// # Example
///
/// ```no_run
/// use hpgat_session::{ChangeLogSink, SerialSession, SessionConfig};
/// use hpgat_serial::UartBackend;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("/dev/ttyUSB0", 115_200, Duration::from_millis(500));
/// let sink = Arc::new(ChangeLogSink::new("logs"));
/// let session = SerialSession::start("dvc1", config, Arc::new(UartBackend::new()), sink);
///
/// if session.is_connected() {
///     session.transmit("AT+WIFI=?").ok();
/// }
/// ```
pub struct SerialSession {
    shared: Arc<SessionShared>,
    supervisor: Option<JoinHandle<()>>,
}

impl SerialSession {
    /// 启动会话：立即返回，连接建立由监督线程异步完成
    ///
    /// # 参数
    /// - `description`: 会话描述，同时作为日志通道名
    /// - `backend`: 串口后端（物理 UART 或 mock）
    /// - `sink`: 接收行的去向
    pub fn start(
        description: impl Into<String>,
        config: SessionConfig,
        backend: Arc<dyn SerialOpen>,
        sink: Arc<dyn ResponseSink>,
    ) -> Self {
        let shared = Arc::new(SessionShared {
            description: description.into(),
            config,
            connected: AtomicBool::new(false),
            running: AtomicBool::new(true),
            tx: Mutex::new(None),
        });

        let shared_loop = shared.clone();
        let supervisor = std::thread::spawn(move || {
            supervisor_loop(backend, shared_loop, sink);
        });

        Self {
            shared,
            supervisor: Some(supervisor),
        }
    }

    /// 会话描述（即日志通道名）
    pub fn description(&self) -> &str {
        &self.shared.description
    }

    /// 连接状态查询（原子读，可与监督线程并发调用）
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Relaxed)
    }

    /// 发送一条命令
    ///
    /// 在命令末尾追加 CRLF 后写出。发送即忘：返回 `Ok` 只表示字节
    /// 已写入串口，与后续收到的任何响应行没有关联关系。
    ///
    /// # 错误
    /// - `SessionError::NotConnected`: 当前断开（监督线程会继续重连）
    /// - `SessionError::Transmit`: 写失败，状态已切回 Disconnected
    pub fn transmit(&self, command: &str) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let mut guard = self.shared.tx.lock();
        let Some(tx) = guard.as_mut() else {
            // 写半部已被监督线程收走（故障竞态）
            return Err(SessionError::NotConnected);
        };

        let wire = format!("{command}\r\n");
        match tx.write_all(wire.as_bytes()) {
            Ok(()) => {
                trace!(session = %self.shared.description, command, "command transmitted");
                Ok(())
            }
            Err(e) => {
                // 写故障即断开；句柄由监督线程在下一迭代重建
                *guard = None;
                self.shared.connected.store(false, Ordering::Relaxed);
                warn!(session = %self.shared.description, error = %e, "transmit failed, session disconnected");
                Err(SessionError::Transmit(e))
            }
        }
    }

    /// 协作式停止：清除运行标志并等待监督线程退出
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.supervisor.take() {
            if handle.join().is_err() {
                warn!(session = %self.shared.description, "supervisor thread panicked");
            }
        }
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 监督循环（长驻线程体）
fn supervisor_loop(
    backend: Arc<dyn SerialOpen>,
    shared: Arc<SessionShared>,
    sink: Arc<dyn ResponseSink>,
) {
    let channel = shared.description.clone();
    let config = shared.config.clone();
    // 读半部由本循环独占
    let mut rx = None;

    info!(session = %channel, port = %config.port, "session supervisor started");

    while shared.running.load(Ordering::Relaxed) {
        if !shared.connected.load(Ordering::Relaxed) {
            // 无条件重连：失败只等下一迭代，不升级退避
            match backend.open(&config.port, config.baud_rate, config.timeout) {
                Ok((r, t)) => {
                    rx = Some(r);
                    *shared.tx.lock() = Some(t);
                    shared.connected.store(true, Ordering::Relaxed);
                    info!(session = %channel, port = %config.port, "serial port connected");
                }
                Err(e) => {
                    debug!(session = %channel, error = %e, "connect attempt failed, will retry");
                }
            }
        } else if let Some(r) = rx.as_mut() {
            match r.read_line() {
                Ok(Some(line)) if !line.is_empty() => {
                    if let Err(e) = sink.record(&channel, &line) {
                        // 单次落盘失败不得中断接收
                        warn!(session = %channel, error = %e, "response line not persisted");
                    }
                }
                // 空行与超时都不算事件
                Ok(_) => {}
                Err(e) => {
                    warn!(session = %channel, error = %e, "read failed, session disconnected");
                    rx = None;
                    *shared.tx.lock() = None;
                    shared.connected.store(false, Ordering::Relaxed);
                }
            }
        }

        std::thread::sleep(config.retry_interval);
    }

    info!(session = %channel, "session supervisor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpgat_serial::mock::MockBackend;
    use crate::sink::PersistError;
    use parking_lot::Mutex as PlMutex;
    use std::time::Instant;

    /// 内存 sink：按通道收集记录（不去重，去重测试见 sink 模块）
    #[derive(Default)]
    struct MemorySink {
        lines: PlMutex<Vec<(String, String)>>,
    }

    impl ResponseSink for MemorySink {
        fn record(&self, channel: &str, line: &str) -> Result<(), PersistError> {
            self.lines.lock().push((channel.to_string(), line.to_string()));
            Ok(())
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            port: "mock0".to_string(),
            baud_rate: 115_200,
            timeout: Duration::from_millis(5),
            retry_interval: Duration::from_millis(1),
        }
    }

    /// 等待条件成立（监督线程是异步的）
    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not met within deadline");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_connects_and_reports_state() {
        let backend = MockBackend::new();
        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| session.is_connected());
    }

    /// 重连性质：一次失败不会造成永久锁死
    #[test]
    fn test_reconnect_after_connect_failure() {
        let backend = MockBackend::new();
        let handle = backend.handle();
        handle.set_fail_connect(true);

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );

        // 至少失败了几次，状态保持断开
        wait_for(|| handle.open_count() >= 3);
        assert!(!session.is_connected());

        handle.set_fail_connect(false);
        wait_for(|| session.is_connected());
    }

    /// 接收路径：行连同通道名转发给 sink
    #[test]
    fn test_received_lines_reach_sink() {
        let backend = MockBackend::new();
        let handle = backend.handle();
        let sink = Arc::new(MemorySink::default());

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            sink.clone(),
        );
        wait_for(|| session.is_connected());

        handle.push_line("+STATWIFI:1");
        handle.push_line("");
        handle.push_line("+STATGNSS:0");

        wait_for(|| sink.lines.lock().len() == 2);
        let lines = sink.lines.lock();
        // 空行被忽略，通道名来自会话描述
        assert_eq!(lines[0], ("dvc1".to_string(), "+STATWIFI:1".to_string()));
        assert_eq!(lines[1], ("dvc1".to_string(), "+STATGNSS:0".to_string()));
    }

    /// 读故障：退回 Disconnected 后自动重连
    #[test]
    fn test_read_fault_disconnects_then_reconnects() {
        let backend = MockBackend::new();
        let handle = backend.handle();

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| session.is_connected());
        let opens_before = handle.open_count();

        handle.inject_rx_fault();
        // 故障触发重连：open 次数增加且重新连上
        wait_for(|| handle.open_count() > opens_before);
        wait_for(|| session.is_connected());
    }

    /// 断开时发送立即失败，不挂起
    #[test]
    fn test_transmit_while_disconnected_fails_fast() {
        let backend = MockBackend::new();
        let handle = backend.handle();
        handle.set_fail_connect(true);

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| handle.open_count() >= 1);

        assert!(matches!(
            session.transmit("AT+WIFI=?").unwrap_err(),
            SessionError::NotConnected
        ));
        assert!(handle.written().is_empty());
    }

    /// 发送路径：追加 CRLF 后写出
    #[test]
    fn test_transmit_appends_crlf() {
        let backend = MockBackend::new();
        let handle = backend.handle();

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| session.is_connected());

        session.transmit("AT+WIFI=homeNet,secret1").unwrap();
        assert_eq!(handle.written(), vec!["AT+WIFI=homeNet,secret1\r\n".to_string()]);
    }

    /// 写故障：返回 Transmit 错误并切回 Disconnected，随后自动重连
    #[test]
    fn test_transmit_fault_disconnects() {
        let backend = MockBackend::new();
        let handle = backend.handle();

        let session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| session.is_connected());

        handle.inject_tx_fault();
        assert!(matches!(
            session.transmit("AT+BRDNFO=?").unwrap_err(),
            SessionError::Transmit(_)
        ));
        // 监督线程随后重建连接
        wait_for(|| session.is_connected());
    }

    /// 协作停止是确定性的（线程可 join，不依赖进程退出）
    #[test]
    fn test_shutdown_is_deterministic() {
        let backend = MockBackend::new();
        let mut session = SerialSession::start(
            "dvc1",
            test_config(),
            Arc::new(backend),
            Arc::new(MemorySink::default()),
        );
        wait_for(|| session.is_connected());
        session.shutdown();
        // 第二次调用无害
        session.shutdown();
    }
}
