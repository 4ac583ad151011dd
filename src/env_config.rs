//! 环境变量配置模块
//!
//! 部署时常通过环境变量覆盖配置文件中的统计地址与输出路径。

use crate::config::{OutputConfig, RegistryConfig};
use std::env;

pub const STATS_ADDR_VAR: &str = "SINK_REGISTRY_STATS_ADDR";
pub const LOG_LEVEL_VAR: &str = "SINK_REGISTRY_LOG_LEVEL";
pub const OUTPUT_PATH_VAR: &str = "SINK_REGISTRY_OUTPUT_PATH";

/// 环境变量配置管理器
pub struct EnvConfig;

impl EnvConfig {
    fn non_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }

    /// 从环境变量读取统计地址
    pub fn get_stats_addr() -> Option<String> {
        Self::non_empty(STATS_ADDR_VAR)
    }

    /// 从环境变量读取日志级别
    pub fn get_log_level() -> Option<String> {
        Self::non_empty(LOG_LEVEL_VAR)
    }

    /// 从环境变量读取输出文件路径
    pub fn get_output_path() -> Option<String> {
        Self::non_empty(OUTPUT_PATH_VAR)
    }

    /// 用环境变量覆盖配置，空值被忽略
    pub fn apply_overrides(config: &mut RegistryConfig) {
        if let Some(stats_addr) = Self::get_stats_addr() {
            config.stats_addr = stats_addr;
        }
        if let Some(level) = Self::get_log_level() {
            config.log_level = level;
        }
        if let Some(path) = Self::get_output_path() {
            match config.output {
                Some(ref mut output) => output.path = path.into(),
                None => config.output = Some(OutputConfig::new(path)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // 环境变量是进程级共享状态，所有断言放在同一个测试里
    #[test]
    fn test_apply_overrides() {
        env::remove_var(STATS_ADDR_VAR);
        env::remove_var(LOG_LEVEL_VAR);
        env::remove_var(OUTPUT_PATH_VAR);

        let mut config = RegistryConfig::from_stats_addr("127.0.0.1:5000");
        EnvConfig::apply_overrides(&mut config);
        assert_eq!(config, RegistryConfig::from_stats_addr("127.0.0.1:5000"));

        env::set_var(STATS_ADDR_VAR, "0.0.0.0:2020");
        env::set_var(LOG_LEVEL_VAR, "");
        env::set_var(OUTPUT_PATH_VAR, "/tmp/outputs.conf");

        EnvConfig::apply_overrides(&mut config);
        assert_eq!(config.stats_addr, "0.0.0.0:2020");
        assert_eq!(config.log_level, "INFO");
        assert_eq!(
            config.output.as_ref().map(|o| o.path.clone()),
            Some(PathBuf::from("/tmp/outputs.conf"))
        );

        // 清理
        env::remove_var(STATS_ADDR_VAR);
        env::remove_var(LOG_LEVEL_VAR);
        env::remove_var(OUTPUT_PATH_VAR);
    }
}
