//! 命令模板存储
//!
//! 模板文件（`hpgApi.json`）结构沿用设备侧约定：
//!
//! ```json
//! {
//!     "wifi": [{ "set": "AT+WIFI=", "get": "AT+WIFI=?", "delete": "AT+ERASE=WIFI" }],
//!     "misc": [{ "dvcModeSet": "AT+HPGMODE=" }]
//! }
//! ```
//!
//! 即类别 -> 单元素列表 -> { 操作键 -> 命令前缀 }。加载时原样解析该嵌套，
//! 内部统一摊平为 `(category, operation) -> prefix`，加载后不可变。

use crate::error::ApiError;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// 模板文件的原始形态：类别 -> 单元素列表 -> { 操作键 -> 前缀 }
type RawTemplates = HashMap<String, Vec<HashMap<String, String>>>;

/// 命令模板存储（加载后不可变）
#[derive(Debug, Clone)]
pub struct TemplateStore {
    /// (category, operation) -> 命令前缀
    prefixes: HashMap<(String, String), String>,
}

impl TemplateStore {
    /// 从 JSON 字符串加载模板
    ///
    /// # 错误
    /// - `ApiError::TemplateLoad`: JSON 格式错误或结构不符
    pub fn from_json_str(json: &str) -> Result<Self, ApiError> {
        let raw: RawTemplates = serde_json::from_str(json)
            .map_err(|e| ApiError::TemplateLoad(format!("malformed template JSON: {e}")))?;
        Ok(Self::flatten(raw))
    }

    /// 从任意 reader 加载模板
    pub fn from_reader(reader: impl Read) -> Result<Self, ApiError> {
        let raw: RawTemplates = serde_json::from_reader(reader)
            .map_err(|e| ApiError::TemplateLoad(format!("malformed template JSON: {e}")))?;
        Ok(Self::flatten(raw))
    }

    /// 从文件路径加载模板
    ///
    /// # 错误
    /// - `ApiError::TemplateLoad`: 文件缺失、不可读或格式错误
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            ApiError::TemplateLoad(format!("cannot open `{}`: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// 摊平原始嵌套结构
    ///
    /// 设备侧约定每个类别是单元素列表；出现多个元素时按顺序合并，
    /// 后出现的键覆盖先出现的。
    fn flatten(raw: RawTemplates) -> Self {
        let mut prefixes = HashMap::new();
        for (category, entries) in raw {
            for entry in entries {
                for (operation, prefix) in entry {
                    prefixes.insert((category.clone(), operation), prefix);
                }
            }
        }
        Self { prefixes }
    }

    /// 查询命令前缀
    ///
    /// # 错误
    /// - `ApiError::UnknownOperation`: (category, operation) 不存在
    pub fn lookup(&self, category: &str, operation: &str) -> Result<&str, ApiError> {
        self.prefixes
            .get(&(category.to_string(), operation.to_string()))
            .map(String::as_str)
            .ok_or_else(|| ApiError::UnknownOperation {
                category: category.to_string(),
                operation: operation.to_string(),
            })
    }

    /// 模板条目数
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    const SAMPLE: &str = r#"{
        "wifi": [{ "set": "AT+WIFI=", "get": "AT+WIFI=?", "delete": "AT+ERASE=WIFI" }],
        "misc": [{ "dvcModeSet": "AT+HPGMODE=" }]
    }"#;

    #[test]
    fn test_load_and_lookup() {
        let store = TemplateStore::from_json_str(SAMPLE).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.lookup("wifi", "set").unwrap(), "AT+WIFI=");
        assert_eq!(store.lookup("misc", "dvcModeSet").unwrap(), "AT+HPGMODE=");
    }

    #[test]
    fn test_unknown_operation_is_hard_error() {
        let store = TemplateStore::from_json_str(SAMPLE).unwrap();
        let err = store.lookup("wifi", "bogus").unwrap_err();
        match err {
            ApiError::UnknownOperation {
                category,
                operation,
            } => {
                assert_eq!(category, "wifi");
                assert_eq!(operation, "bogus");
            }
            other => panic!("Expected UnknownOperation, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_fails_load() {
        let err = TemplateStore::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ApiError::TemplateLoad(_)));

        // 结构不符（类别不是列表）也视为加载失败
        let err = TemplateStore::from_json_str(r#"{ "wifi": { "set": "AT+WIFI=" } }"#).unwrap_err();
        assert!(matches!(err, ApiError::TemplateLoad(_)));
    }

    #[test]
    fn test_missing_file_fails_load() {
        let err = TemplateStore::load("/nonexistent/hpgApi.json").unwrap_err();
        assert!(matches!(err, ApiError::TemplateLoad(_)));
    }
}
