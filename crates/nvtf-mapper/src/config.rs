//! 配置管理模块
//!
//! 映射器的行为由 [`MapperConfig`] 决定：使用哪个标签命名空间、记录转换是
//! 宽松还是严格、写入记录存储时是否跳过序列值。配置可以从 YAML 或 JSON
//! 文件加载。

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// 默认标签命名空间
pub const DEFAULT_TAG_NAMESPACE: &str = "json";

/// 记录转换模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 忽略未匹配的键与不兼容的值
    #[default]
    Permissive,
    /// 未匹配的键与不兼容的值都视为错误
    Strict,
}

/// 映射器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// 外部键所在的标签命名空间
    pub tag_namespace: String,
    /// 记录转换模式
    pub mode: Mode,
    /// 写入记录存储时跳过序列值
    pub skip_sequences: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            tag_namespace: DEFAULT_TAG_NAMESPACE.to_string(),
            mode: Mode::Permissive,
            skip_sequences: true,
        }
    }
}

impl MapperConfig {
    /// 严格模式的默认配置
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Self::default()
        }
    }

    /// 设置标签命名空间
    pub fn with_tag_namespace(mut self, namespace: &str) -> Self {
        self.tag_namespace = namespace.to_string();
        self
    }

    /// 设置是否跳过序列值
    pub fn with_skip_sequences(mut self, skip: bool) -> Self {
        self.skip_sequences = skip;
        self
    }

    /// 从配置文件加载，格式由扩展名决定
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => {
                return Err(Error::Config(format!(
                    "不支持的配置文件格式 {:?}，仅支持 YAML 或 JSON",
                    path
                )))
            }
        };

        let settings = Config::builder()
            .add_source(File::from(path).format(format))
            .build()
            .map_err(|e| Error::Config(format!("无法加载配置文件 {:?}: {}", path, e)))?;

        let config = settings
            .try_deserialize::<MapperConfig>()
            .map_err(|e| Error::Config(format!("配置格式错误: {}", e)))?;

        if config.tag_namespace.is_empty() {
            return Err(Error::Config("标签命名空间不能为空".to_string()));
        }

        debug!(?path, namespace = %config.tag_namespace, mode = ?config.mode, "已加载映射器配置");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.tag_namespace, "json");
        assert_eq!(config.mode, Mode::Permissive);
        assert!(config.skip_sequences);
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(".yaml", "tag_namespace: yaml\nmode: strict\n");
        let config = MapperConfig::from_file(file.path()).unwrap();

        assert_eq!(config.tag_namespace, "yaml");
        assert_eq!(config.mode, Mode::Strict);
        // 未出现的字段取默认值
        assert!(config.skip_sequences);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"skip_sequences": false}"#);
        let config = MapperConfig::from_file(file.path()).unwrap();

        assert_eq!(config.tag_namespace, "json");
        assert_eq!(config.mode, Mode::Permissive);
        assert!(!config.skip_sequences);
    }

    #[test]
    fn test_unsupported_format() {
        let file = write_config(".toml", "mode = \"strict\"\n");
        assert!(matches!(
            MapperConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let file = write_config(".yml", "tag_namespace: \"\"\n");
        assert!(matches!(
            MapperConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
