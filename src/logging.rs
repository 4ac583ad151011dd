//! 日志初始化
//!
//! 注册表本身只通过 `tracing` 宏输出日志，由宿主进程决定是否安装订阅器。
//! 这里提供一个基于 `tracing-subscriber` 的默认实现。

use crate::config::{validate_log_level, RegistryConfig};
use crate::error::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 构建日志过滤器，`RUST_LOG` 优先于配置的级别
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    validate_log_level(level)?;
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase())))
}

/// 安装全局 fmt 订阅器
///
/// # 返回值
///
/// 已存在全局订阅器时返回 `Ok(false)`，不视为错误
pub fn init_logging(level: &str) -> Result<bool> {
    let filter = build_filter(level)?;
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    Ok(installed)
}

/// 使用配置中的日志级别初始化
pub fn init_logging_from_config(config: &RegistryConfig) -> Result<bool> {
    init_logging(&config.log_level)
}
