//! AT 命令层错误类型定义

use thiserror::Error;

/// AT 命令层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 模板加载失败（文件缺失或格式错误）
    ///
    /// 启动期致命错误：没有模板就无法构造任何命令。
    #[error("Template load error: {0}")]
    TemplateLoad(String),

    /// 未知操作（编程/配置错误，测试中应视为硬失败）
    #[error("Unknown operation: {category}.{operation}")]
    UnknownOperation {
        /// 模板类别（wifi / apn / thingstream / ntrip / status / misc）
        category: String,
        /// 操作键（set / get / brokerSet / ...）
        operation: String,
    },

    /// 参数校验失败（用户输入错误，可恢复，提示后重试）
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// 参数名
        field: String,
        /// 拒绝原因
        reason: String,
    },
}

impl ApiError {
    /// 构造参数校验错误
    pub(crate) fn invalid_param(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
