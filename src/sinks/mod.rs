//! Sink 声明与输出段渲染
//!
//! - `declaration`: 命名空间级与集群级 sink 的数据模型和身份键
//! - `stanza`: `[OUTPUT]` 段构建器
//! - `syslog`: 汇总所有 syslog sink 的输出段
//! - `webhook`: 每个 webhook sink 一个 http 输出段

pub mod declaration;
pub mod stanza;
pub mod syslog;
pub mod webhook;

// 重新导出主要类型
pub use declaration::{
    canonical_namespace, cluster_sink_key, sink_key, ClusterLogSink, LogSink, SinkDeclaration,
    SinkSpec, SinkType,
};
pub use stanza::{null_stanza, Stanza};
pub use syslog::{syslog_stanza, SyslogRecord, TlsRecord};
pub use webhook::{http_stanza, parse_webhook_url, webhook_stanzas};
