//! 变更检测日志
//!
//! 接收循环把每一行连同逻辑通道名交给 sink；sink 只在该行与同通道
//! 上一条记录不同的情况下落盘，连续重复行静默丢弃。每通道只保留
//! 最近一行用于比较（O(1) 内存，不保留历史）。
//!
//! 落盘格式：`<line>;<timestamp>\r` 追加到 `<root>/<channel>/log.csv`；
//! 写失败时尽力把 `<error>;<line>` 记入同目录 `errors.log`，并返回
//! [`PersistError`] 由调用方记日志——单次写失败绝不中断后续接收。

use chrono::Local;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// 日志落盘失败
#[derive(Error, Debug)]
#[error("Persist error for channel `{channel}`: {source}")]
pub struct PersistError {
    /// 逻辑通道名
    pub channel: String,
    #[source]
    source: std::io::Error,
}

impl PersistError {
    /// 构造落盘错误（自定义 [`ResponseSink`] 实现的失败路径用）
    pub fn new(channel: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            channel: channel.into(),
            source,
        }
    }
}

/// 响应行接收端
///
/// 接收循环对 sink 的唯一依赖点，测试中用内存实现替换。
pub trait ResponseSink: Send + Sync {
    /// 记录一行（内部按通道去重）
    fn record(&self, channel: &str, line: &str) -> Result<(), PersistError>;
}

/// 按通道去重的追加式文件日志
pub struct ChangeLogSink {
    root: PathBuf,
    /// 每通道最近一条已记录的行
    last_seen: Mutex<HashMap<String, String>>,
}

impl ChangeLogSink {
    /// 创建 sink，`root` 下按通道建子目录（懒创建）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    fn channel_dir(&self, channel: &str) -> PathBuf {
        self.root.join(channel)
    }

    fn append(path: &Path, record: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(record.as_bytes())
    }
}

impl ResponseSink for ChangeLogSink {
    fn record(&self, channel: &str, line: &str) -> Result<(), PersistError> {
        // 锁覆盖比较与落盘：同一通道多会话并发写时保持串行
        let mut last_seen = self.last_seen.lock();
        if last_seen.get(channel).map(String::as_str) == Some(line) {
            return Ok(());
        }

        let dir = self.channel_dir(channel);
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
        let record = format!("{line};{timestamp}\r");

        let result = std::fs::create_dir_all(&dir)
            .and_then(|()| Self::append(&dir.join("log.csv"), &record));

        match result {
            Ok(()) => {
                debug!(channel, line, "response line logged");
                last_seen.insert(channel.to_string(), line.to_string());
                Ok(())
            }
            Err(source) => {
                // 尽力而为的故障记录，失败则只剩 tracing
                let fallback = format!("{source};{line}\r");
                if let Err(e) = Self::append(&dir.join("errors.log"), &fallback) {
                    warn!(channel, error = %e, "error log write failed");
                }
                Err(PersistError {
                    channel: channel.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_log(root: &Path, channel: &str) -> Vec<String> {
        let content = std::fs::read_to_string(root.join(channel).join("log.csv")).unwrap();
        content
            .split('\r')
            .filter(|s| !s.is_empty())
            .map(|s| s.split(';').next().unwrap().to_string())
            .collect()
    }

    /// 去重性质：落盘条数 = 相等连续行的极大段数
    #[test]
    fn test_run_length_deduplication() {
        let dir = tempdir().unwrap();
        let sink = ChangeLogSink::new(dir.path());

        for line in ["A", "A", "B", "B", "B", "A"] {
            sink.record("dvc1", line).unwrap();
        }

        assert_eq!(read_log(dir.path(), "dvc1"), vec!["A", "B", "A"]);
    }

    /// 通道之间互不影响去重状态
    #[test]
    fn test_channels_are_independent() {
        let dir = tempdir().unwrap();
        let sink = ChangeLogSink::new(dir.path());

        sink.record("c213", "OK").unwrap();
        sink.record("c214", "OK").unwrap();
        sink.record("c213", "OK").unwrap();

        assert_eq!(read_log(dir.path(), "c213"), vec!["OK"]);
        assert_eq!(read_log(dir.path(), "c214"), vec!["OK"]);
    }

    /// 记录格式：`<line>;<timestamp>\r`
    #[test]
    fn test_record_format() {
        let dir = tempdir().unwrap();
        let sink = ChangeLogSink::new(dir.path());
        sink.record("dvc1", "+STATHPG:CONFIG").unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("dvc1").join("log.csv")).unwrap();
        assert!(content.starts_with("+STATHPG:CONFIG;"));
        assert!(content.ends_with('\r'));
    }

    /// 写失败返回 PersistError，且不更新去重状态
    #[test]
    fn test_persist_failure_is_reported() {
        let dir = tempdir().unwrap();
        // 用一个普通文件占住通道目录的位置，create_dir_all 必然失败
        let blocked = dir.path().join("dvc1");
        std::fs::write(&blocked, b"not a dir").unwrap();

        let sink = ChangeLogSink::new(dir.path());
        let err = sink.record("dvc1", "OK").unwrap_err();
        assert_eq!(err.channel, "dvc1");

        // 失败的行未被记为"已见"，条件恢复后重新落盘
        std::fs::remove_file(&blocked).unwrap();
        sink.record("dvc1", "OK").unwrap();
        assert_eq!(read_log(dir.path(), "dvc1"), vec!["OK"]);
    }
}
