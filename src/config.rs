//! 定义注册表及其输出的所有配置结构体。

use crate::error::{Result, SinkRegistryError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// --- 辅助函数，用于提供配置项的默认值 ---
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_true() -> bool {
    true
}

const LOG_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// 注册表的顶层配置结构体。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// 嵌入到 null 段与 syslog 段中的统计地址
    pub stats_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub output: Option<OutputConfig>,
}

impl RegistryConfig {
    /// 仅指定统计地址，其余使用默认值
    pub fn from_stats_addr(stats_addr: impl Into<String>) -> Self {
        Self {
            stats_addr: stats_addr.into(),
            log_level: default_log_level(),
            output: None,
        }
    }
}

/// 渲染结果的落盘配置。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub create_parents: bool,
}

impl OutputConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_parents: default_true(),
        }
    }
}

/// 用于从 TOML 文件加载 `RegistryConfig` 的辅助函数。
pub fn load_config_from_file(path: &Path) -> Result<RegistryConfig> {
    if !path.exists() {
        return Err(SinkRegistryError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = std::fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// 用于从 TOML 字符串加载 `RegistryConfig` 的辅助函数。
pub fn load_config_from_str(config_str: &str) -> Result<RegistryConfig> {
    let config: RegistryConfig = toml::from_str(config_str)?;
    Ok(config)
}

/// 校验日志级别是否受支持
pub fn validate_log_level(level: &str) -> Result<()> {
    if LOG_LEVELS.contains(&level.to_uppercase().as_str()) {
        Ok(())
    } else {
        Err(SinkRegistryError::InvalidLogLevel(level.to_string()))
    }
}

/// 验证配置的有效性。
pub fn validate_config(config: &RegistryConfig) -> Result<()> {
    // 统计地址会原样写入输出段，不能为空或包含空白
    if config.stats_addr.trim().is_empty() {
        return Err(SinkRegistryError::config("stats_addr 不能为空"));
    }
    if config.stats_addr.chars().any(char::is_whitespace) {
        return Err(SinkRegistryError::config(format!(
            "stats_addr 不能包含空白字符: {:?}",
            config.stats_addr
        )));
    }

    validate_log_level(&config.log_level)?;

    if let Some(ref output) = config.output {
        if output.path.as_os_str().is_empty() {
            return Err(SinkRegistryError::InvalidPath(
                "输出文件路径不能为空".to_string(),
            ));
        }
        if output.path.file_name().is_none() {
            return Err(SinkRegistryError::InvalidPath(format!(
                "输出路径必须指向文件: {:?}",
                output.path
            )));
        }
    }

    Ok(())
}
