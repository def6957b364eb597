//! # HPG AT 命令层
//!
//! 提供 XPLR-HPG 板卡 AT 命令的模板存储与命令构造功能：
//! - 模板存储（[`TemplateStore`]）：从 JSON 模板文件加载 (category, operation) -> 前缀映射
//! - 命令构造（[`AtApi`]）：参数校验 + 模板拼接，输出可直接发送的命令字符串
//!
//! 本层为纯数据层，无 IO、无状态变更；串口传输见 `hpgat-session`。
//!
//! # Example
//!
//! ```
//! use hpgat_api::{AtApi, TemplateStore};
//!
//! let json = r#"{ "wifi": [{ "set": "AT+WIFI=" }] }"#;
//! let api = AtApi::new(TemplateStore::from_json_str(json).unwrap());
//! let cmd = api.wifi_set("homeNet", "secret1").unwrap();
//! assert_eq!(cmd, "AT+WIFI=homeNet,secret1");
//! ```

mod api;
mod error;
mod params;
mod template;

pub use api::AtApi;
pub use error::ApiError;
pub use params::{CorrectionModule, CorrectionSource, DeviceMode, NetInterface, NvsConfigMode};
pub use template::TemplateStore;
