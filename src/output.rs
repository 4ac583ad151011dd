//! 渲染结果落盘
//!
//! 转发代理监视配置文件并在内容变化时重载，因此只在字节发生变化时才写入，
//! 写入经由同目录临时文件再重命名，代理不会读到写了一半的文件。

use crate::config::{OutputConfig, RegistryConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SinkRegistryError};
use crate::registry::SinkRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

const TEMP_SUFFIX: &str = ".tmp";

/// 配置文件写入器
#[derive(Debug)]
pub struct ConfigFileWriter {
    config: OutputConfig,
    /// 最近一次确认与磁盘一致的内容
    last_written: Mutex<Option<String>>,
    diagnostics: Arc<Diagnostics>,
}

impl ConfigFileWriter {
    /// 创建新的写入器
    pub fn new(config: OutputConfig) -> Self {
        Self::with_diagnostics(config, Arc::new(Diagnostics::new()))
    }

    /// 与注册表共享诊断计数器
    pub fn for_registry(config: OutputConfig, registry: &SinkRegistry) -> Self {
        Self::with_diagnostics(config, registry.diagnostics())
    }

    pub fn with_diagnostics(config: OutputConfig, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            config,
            last_written: Mutex::new(None),
            diagnostics,
        }
    }

    /// 配置中未设置 `[output]` 时返回 `None`
    pub fn from_config(config: &RegistryConfig, registry: &SinkRegistry) -> Option<Self> {
        config
            .output
            .clone()
            .map(|output| Self::for_registry(output, registry))
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self.config.path.file_name().ok_or_else(|| {
            SinkRegistryError::InvalidPath(format!(
                "输出路径必须指向文件: {}",
                self.config.path.display()
            ))
        })?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(TEMP_SUFFIX);
        Ok(self.config.path.with_file_name(temp_name))
    }

    /// 写入渲染结果
    ///
    /// # 返回值
    ///
    /// 内容与磁盘一致时不写入并返回 `Ok(false)`
    pub async fn write(&self, contents: &str) -> Result<bool> {
        let mut last_written = self.last_written.lock().await;

        if last_written.as_deref() == Some(contents) {
            return Ok(false);
        }

        // 进程重启后首次写入，与已有文件比较
        if last_written.is_none() {
            if let Ok(existing) = fs::read_to_string(&self.config.path).await {
                if existing == contents {
                    debug!(path = %self.config.path.display(), "existing configuration is up to date");
                    *last_written = Some(existing);
                    return Ok(false);
                }
            }
        }

        if self.config.create_parents {
            if let Some(parent) = self.config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
        }

        let temp_path = self.temp_path()?;
        fs::write(&temp_path, contents).await?;
        if let Err(e) = fs::rename(&temp_path, &self.config.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(SinkRegistryError::output(format!(
                "无法替换 {}: {}",
                self.config.path.display(),
                e
            )));
        }

        *last_written = Some(contents.to_string());
        self.diagnostics.increment_output_writes();
        info!(
            path = %self.config.path.display(),
            bytes = contents.len(),
            "rendered configuration written"
        );
        Ok(true)
    }

    /// 渲染注册表并写入
    pub async fn sync_from(&self, registry: &SinkRegistry) -> Result<bool> {
        let contents = registry.render();
        self.write(&contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::declaration::{LogSink, SinkSpec};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_only_when_changed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.conf");
        let writer = ConfigFileWriter::new(OutputConfig::new(&path));

        assert!(writer.write("first").await.unwrap());
        assert!(!writer.write("first").await.unwrap());
        assert!(writer.write("second").await.unwrap());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_file_name("outputs.conf.tmp").exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_not_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.conf");
        std::fs::write(&path, "same").unwrap();

        let writer = ConfigFileWriter::new(OutputConfig::new(&path));
        assert!(!writer.write("same").await.unwrap());
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fluent-bit").join("conf").join("outputs.conf");

        let writer = ConfigFileWriter::new(OutputConfig::new(&path));
        assert!(writer.write("content").await.unwrap());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_missing_parent_without_create() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("outputs.conf");

        let mut config = OutputConfig::new(&path);
        config.create_parents = false;
        let writer = ConfigFileWriter::new(config);

        let err = writer.write("content").await.unwrap_err();
        assert!(matches!(err, SinkRegistryError::IoError { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_sync_from_registry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.conf");

        let registry = SinkRegistry::new("127.0.0.1:5000");
        let writer = ConfigFileWriter::for_registry(OutputConfig::new(&path), &registry);

        assert!(writer.sync_from(&registry).await.unwrap());
        assert!(!writer.sync_from(&registry).await.unwrap());

        registry.upsert_sink(LogSink::new("ns", "app", SinkSpec::syslog("example.com", 514)));
        assert!(writer.sync_from(&registry).await.unwrap());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), registry.render());
        assert_eq!(registry.diagnostics().snapshot().output_writes, 2);
    }

    #[test]
    fn test_from_config_without_output() {
        let config = RegistryConfig::from_stats_addr("127.0.0.1:5000");
        let registry = SinkRegistry::from_config(&config);
        assert!(ConfigFileWriter::from_config(&config, &registry).is_none());
    }
}
