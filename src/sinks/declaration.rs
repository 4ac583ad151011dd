//! Sink 声明
//!
//! 描述命名空间级 (`LogSink`) 与集群级 (`ClusterLogSink`) 的日志 sink，
//! 以及用于在注册表中定位它们的身份键。

use crate::error::{Result, SinkRegistryError};
use serde::{Deserialize, Serialize};
use url::Url;

/// 身份键分隔符。
///
/// `|` 不会出现在 Kubernetes 的命名空间或对象名称中，
/// 因此 `(scope, name)` 到键的映射是单射。
pub const KEY_SEPARATOR: char = '|';

/// 空命名空间在渲染时使用的名称
pub const DEFAULT_NAMESPACE: &str = "default";

/// Sink 类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    /// syslog 端点
    Syslog,
    /// HTTP webhook
    Webhook,
    /// 其他任何类型，渲染时忽略
    #[serde(other)]
    Unknown,
}

impl SinkType {
    /// 类型的字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkType::Syslog => "syslog",
            SinkType::Webhook => "webhook",
            SinkType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink 规格
///
/// syslog 类型使用 `host`/`port`/`enableTLS`/`insecureSkipVerify`，
/// webhook 类型使用 `url`。与类型无关的字段保持默认值。
/// 反序列化同时接受蛇形写法，拒绝未知字段。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SinkSpec {
    #[serde(rename = "type")]
    pub sink_type: SinkType,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default, rename = "enableTLS", alias = "enable_tls")]
    pub enable_tls: bool,
    #[serde(default, alias = "insecure_skip_verify")]
    pub insecure_skip_verify: bool,
    #[serde(default)]
    pub url: String,
}

impl SinkSpec {
    /// 创建 syslog 规格（默认不启用 TLS）
    pub fn syslog(host: impl Into<String>, port: u16) -> Self {
        Self {
            sink_type: SinkType::Syslog,
            host: host.into(),
            port,
            enable_tls: false,
            insecure_skip_verify: false,
            url: String::new(),
        }
    }

    /// 创建 webhook 规格
    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            sink_type: SinkType::Webhook,
            host: String::new(),
            port: 0,
            enable_tls: false,
            insecure_skip_verify: false,
            url: url.into(),
        }
    }

    /// 启用 TLS
    pub fn with_tls(mut self, insecure_skip_verify: bool) -> Self {
        self.enable_tls = true;
        self.insecure_skip_verify = insecure_skip_verify;
        self
    }

    /// syslog 地址 `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 检查与类型相关的字段
    ///
    /// 渲染不会调用它：格式错误的声明照样渲染或被丢弃。
    /// 供希望在 upsert 之前拒绝声明的调用方使用。
    pub fn validate(&self) -> Result<()> {
        match self.sink_type {
            SinkType::Syslog => {
                if self.host.is_empty() {
                    return Err(SinkRegistryError::validation("syslog sink 缺少 host"));
                }
                if self.port == 0 {
                    return Err(SinkRegistryError::validation("syslog sink 的端口必须在 1-65535 之间"));
                }
                Ok(())
            }
            SinkType::Webhook => {
                Url::parse(&self.url)?;
                Ok(())
            }
            SinkType::Unknown => Err(SinkRegistryError::validation("未知的 sink 类型")),
        }
    }
}

/// 命名空间级日志 sink
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogSink {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub spec: SinkSpec,
}

impl LogSink {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: SinkSpec) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            spec,
        }
    }

    /// 从 JSON 文档解析
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 注册表中的身份键
    pub fn key(&self) -> String {
        sink_key(&self.namespace, &self.name)
    }
}

/// 集群级日志 sink
///
/// `cluster_name` 通常为空，仅参与身份键的构造。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClusterLogSink {
    #[serde(default)]
    pub cluster_name: String,
    pub name: String,
    pub spec: SinkSpec,
}

impl ClusterLogSink {
    pub fn new(name: impl Into<String>, spec: SinkSpec) -> Self {
        Self {
            cluster_name: String::new(),
            name: name.into(),
            spec,
        }
    }

    /// 设置集群作用域标识
    pub fn with_cluster_name(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    /// 从 JSON 文档解析
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 注册表中的身份键
    pub fn key(&self) -> String {
        cluster_sink_key(&self.cluster_name, &self.name)
    }
}

/// 任一作用域的 sink 声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDeclaration {
    Namespaced(LogSink),
    Cluster(ClusterLogSink),
}

impl SinkDeclaration {
    pub fn spec(&self) -> &SinkSpec {
        match self {
            SinkDeclaration::Namespaced(sink) => &sink.spec,
            SinkDeclaration::Cluster(sink) => &sink.spec,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SinkDeclaration::Namespaced(sink) => &sink.name,
            SinkDeclaration::Cluster(sink) => &sink.name,
        }
    }
}

impl From<LogSink> for SinkDeclaration {
    fn from(sink: LogSink) -> Self {
        SinkDeclaration::Namespaced(sink)
    }
}

impl From<ClusterLogSink> for SinkDeclaration {
    fn from(sink: ClusterLogSink) -> Self {
        SinkDeclaration::Cluster(sink)
    }
}

/// 命名空间级 sink 的身份键
pub fn sink_key(namespace: &str, name: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}{name}")
}

/// 集群级 sink 的身份键
pub fn cluster_sink_key(cluster_name: &str, name: &str) -> String {
    format!("{cluster_name}{KEY_SEPARATOR}{name}")
}

/// 空命名空间映射为 `default`，其余原样返回
pub fn canonical_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    }
}
