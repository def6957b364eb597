//! 设备配置文件（`config.json`）
//!
//! 结构沿用设备侧约定：`devices` 列表给出串口参数，
//! `settings` / `thingstream` / `ntrip` 为单元素列表，承载
//! "从文件批量配置"用到的取值。缺失或格式错误在启动期即失败。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 完整设备配置
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// 受管设备（当前范围内只使用第一个条目）
    pub devices: Vec<DeviceEntry>,
    /// 设备级设置（单元素列表）
    #[serde(default)]
    pub settings: Vec<DeviceSettings>,
    /// Thingstream 设置（单元素列表）
    #[serde(default)]
    pub thingstream: Vec<ThingstreamSettings>,
    /// NTRIP 设置（单元素列表）
    #[serde(default)]
    pub ntrip: Vec<NtripSettings>,
}

/// 串口连接参数
#[derive(Debug, Deserialize)]
pub struct DeviceEntry {
    /// 会话描述，同时作为日志通道名
    pub description: String,
    /// 串口路径
    pub serialport: String,
    /// 波特率
    pub baudrate: u32,
    /// 读超时（秒，可为小数）
    pub timeout: f64,
}

impl DeviceEntry {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

/// 设备级设置
#[derive(Debug, Deserialize)]
pub struct DeviceSettings {
    pub interface: String,
    pub ssid: String,
    pub password: String,
    pub apn: String,
    #[serde(rename = "correctionSource")]
    pub correction_source: String,
    #[serde(rename = "correctionModule")]
    pub correction_module: String,
    #[serde(rename = "gnssDR")]
    pub gnss_dr: String,
    #[serde(rename = "sdLog")]
    pub sd_log: String,
}

/// Thingstream 设置
#[derive(Debug, Deserialize)]
pub struct ThingstreamSettings {
    pub broker: String,
    pub port: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub cert: String,
    pub key: String,
    #[serde(rename = "rootCa")]
    pub root_ca: String,
    pub region: String,
    pub plan: String,
}

/// NTRIP 设置
#[derive(Debug, Deserialize)]
pub struct NtripSettings {
    pub server: String,
    pub port: String,
    #[serde(rename = "mountPoint")]
    pub mount_point: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "ggaRelay")]
    pub gga_relay: String,
}

impl DeviceConfig {
    /// 加载配置文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open device config `{}`", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("malformed device config `{}`", path.display()))
    }

    /// 第一个设备条目（驱动会话）
    pub fn primary_device(&self) -> Result<&DeviceEntry> {
        self.devices
            .first()
            .context("device config has an empty `devices` list")
    }

    pub fn settings(&self) -> Option<&DeviceSettings> {
        self.settings.first()
    }

    pub fn thingstream(&self) -> Option<&ThingstreamSettings> {
        self.thingstream.first()
    }

    pub fn ntrip(&self) -> Option<&NtripSettings> {
        self.ntrip.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "devices": [
                { "description": "dvc1", "serialport": "/dev/ttyUSB0", "baudrate": 115200, "timeout": 0.5 }
            ],
            "settings": [{
                "interface": "wi-fi", "ssid": "homeNet", "password": "secret1", "apn": "internet",
                "correctionSource": "ts", "correctionModule": "ip", "gnssDR": "0", "sdLog": "1"
            }],
            "thingstream": [{
                "broker": "mqtt.example.com", "port": "8883", "clientId": "device-42",
                "cert": "CERT", "key": "KEY", "rootCa": "ROOTCA", "region": "eu", "plan": "ip"
            }],
            "ntrip": [{
                "server": "ntrip.example.com", "port": "2101", "mountPoint": "MP1",
                "userAgent": "hpgat", "username": "user", "password": "pass", "ggaRelay": "1"
            }]
        }"#;

        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        let device = config.primary_device().unwrap();
        assert_eq!(device.description, "dvc1");
        assert_eq!(device.timeout(), Duration::from_millis(500));
        assert_eq!(config.settings().unwrap().correction_source, "ts");
        assert_eq!(config.thingstream().unwrap().client_id, "device-42");
        assert_eq!(config.ntrip().unwrap().mount_point, "MP1");
    }

    #[test]
    fn test_optional_sections_default_empty() {
        let json = r#"{
            "devices": [
                { "description": "dvc1", "serialport": "/dev/ttyUSB0", "baudrate": 115200, "timeout": 1.0 }
            ]
        }"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert!(config.settings().is_none());
        assert!(config.thingstream().is_none());
        assert!(config.ntrip().is_none());
    }
}
