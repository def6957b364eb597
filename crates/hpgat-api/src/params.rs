//! 枚举型命令参数
//!
//! 设备固件对这几个参数只接受固定取值（区分大小写），超出集合的值
//! 在构造阶段即拒绝，绝不上线。线上拼写以 `as_str()` 为准。

use crate::error::ApiError;
use std::str::FromStr;

/// 通信接口选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetInterface {
    /// Wi-Fi 接口（线上拼写 "wi-fi"）
    WiFi,
    /// 蜂窝接口（线上拼写 "cell"）
    Cell,
}

impl NetInterface {
    /// 线上拼写
    pub fn as_str(self) -> &'static str {
        match self {
            NetInterface::WiFi => "wi-fi",
            NetInterface::Cell => "cell",
        }
    }
}

impl FromStr for NetInterface {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wi-fi" => Ok(NetInterface::WiFi),
            "cell" => Ok(NetInterface::Cell),
            _ => Err(ApiError::invalid_param(
                "interface",
                format!("`{s}` not in {{wi-fi, cell}}"),
            )),
        }
    }
}

/// 差分改正数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionSource {
    /// Thingstream（线上拼写 "ts"）
    Thingstream,
    /// NTRIP caster（线上拼写 "ntrip"）
    Ntrip,
}

impl CorrectionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionSource::Thingstream => "ts",
            CorrectionSource::Ntrip => "ntrip",
        }
    }
}

impl FromStr for CorrectionSource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" => Ok(CorrectionSource::Thingstream),
            "ntrip" => Ok(CorrectionSource::Ntrip),
            _ => Err(ApiError::invalid_param(
                "correction_source",
                format!("`{s}` not in {{ts, ntrip}}"),
            )),
        }
    }
}

/// 差分改正数据接收模块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionModule {
    /// IP 链路（线上拼写 "ip"）
    Ip,
    /// L-band 卫星链路（线上拼写 "lband"）
    LBand,
}

impl CorrectionModule {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionModule::Ip => "ip",
            CorrectionModule::LBand => "lband",
        }
    }
}

impl FromStr for CorrectionModule {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip" => Ok(CorrectionModule::Ip),
            "lband" => Ok(CorrectionModule::LBand),
            _ => Err(ApiError::invalid_param(
                "correction_module",
                format!("`{s}` not in {{ip, lband}}"),
            )),
        }
    }
}

/// 设备运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// 配置模式，设备接受配置命令
    Config,
    /// 启动 HPG 业务
    Start,
    /// 停止 HPG 业务
    Stop,
}

impl DeviceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceMode::Config => "config",
            DeviceMode::Start => "start",
            DeviceMode::Stop => "stop",
        }
    }
}

impl FromStr for DeviceMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config" => Ok(DeviceMode::Config),
            "start" => Ok(DeviceMode::Start),
            "stop" => Ok(DeviceMode::Stop),
            _ => Err(ApiError::invalid_param(
                "mode",
                format!("`{s}` not in {{config, start, stop}}"),
            )),
        }
    }
}

/// NVS 配置模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvsConfigMode {
    /// 手动配置
    Manual,
    /// 开机自动加载
    Auto,
    /// 保存当前配置
    Save,
}

impl NvsConfigMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NvsConfigMode::Manual => "MANUAL",
            NvsConfigMode::Auto => "AUTO",
            NvsConfigMode::Save => "SAVE",
        }
    }
}

impl FromStr for NvsConfigMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(NvsConfigMode::Manual),
            "AUTO" => Ok(NvsConfigMode::Auto),
            "SAVE" => Ok(NvsConfigMode::Save),
            _ => Err(ApiError::invalid_param(
                "nvs_mode",
                format!("`{s}` not in {{MANUAL, AUTO, SAVE}}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_members() {
        for v in ["wi-fi", "cell"] {
            assert_eq!(v.parse::<NetInterface>().unwrap().as_str(), v);
        }
        for v in ["ts", "ntrip"] {
            assert_eq!(v.parse::<CorrectionSource>().unwrap().as_str(), v);
        }
        for v in ["ip", "lband"] {
            assert_eq!(v.parse::<CorrectionModule>().unwrap().as_str(), v);
        }
        for v in ["config", "start", "stop"] {
            assert_eq!(v.parse::<DeviceMode>().unwrap().as_str(), v);
        }
        for v in ["MANUAL", "AUTO", "SAVE"] {
            assert_eq!(v.parse::<NvsConfigMode>().unwrap().as_str(), v);
        }
    }

    #[test]
    fn test_case_sensitive_rejection() {
        // 集合外与大小写不符的值一律拒绝
        assert!("WI-FI".parse::<NetInterface>().is_err());
        assert!("wifi".parse::<NetInterface>().is_err());
        assert!("TS".parse::<CorrectionSource>().is_err());
        assert!("Lband".parse::<CorrectionModule>().is_err());
        assert!("paused".parse::<DeviceMode>().is_err());
        assert!("manual".parse::<NvsConfigMode>().is_err());
    }
}
