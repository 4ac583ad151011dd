//! sink_registry - 日志 sink 注册表与转发代理配置渲染
//!
//! 维护命名空间级与集群级日志 sink 声明的内存注册表，
//! 并将其渲染为日志转发代理使用的 `[OUTPUT]` 配置段（syslog 与 http）。
//! 本库不转发日志，也不与任何 sink 通信，只生成配置文本。
//!
//! # 快速开始
//!
//! ```rust
//! use sink_registry::{ClusterLogSink, LogSink, SinkRegistry, SinkSpec};
//!
//! let registry = SinkRegistry::new("127.0.0.1:5000");
//!
//! // 空注册表渲染为 null 输出段
//! assert!(registry.render().contains("Name null"));
//!
//! registry.upsert_sink(LogSink::new("team-a", "audit", SinkSpec::syslog("logs.example.com", 514)));
//! registry.upsert_cluster_sink(ClusterLogSink::new("all", SinkSpec::webhook("https://example.com/ingest")));
//!
//! let config = registry.render();
//! assert!(config.contains("Name syslog"));
//! assert!(config.contains("Port 443"));
//! ```
//!
//! # 从配置文件启动
//!
//! ```rust,no_run
//! use sink_registry::{
//!     load_config_from_file, validate_config, ConfigFileWriter, EnvConfig, SinkRegistry,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = load_config_from_file(Path::new("registry.toml"))?;
//!     EnvConfig::apply_overrides(&mut config);
//!     validate_config(&config)?;
//!     sink_registry::logging::init_logging_from_config(&config)?;
//!
//!     let registry = SinkRegistry::from_config(&config);
//!     if let Some(writer) = ConfigFileWriter::from_config(&config, &registry) {
//!         writer.sync_from(&registry).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod env_config;
pub mod error;
pub mod logging;
pub mod output;
pub mod registry;
pub mod sinks;

// 重新导出主要类型
pub use config::{
    load_config_from_file, load_config_from_str, validate_config, OutputConfig, RegistryConfig,
};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use env_config::EnvConfig;
pub use error::{Result, SinkRegistryError};
pub use output::ConfigFileWriter;
pub use registry::SinkRegistry;
pub use sinks::{ClusterLogSink, LogSink, SinkDeclaration, SinkSpec, SinkType};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
