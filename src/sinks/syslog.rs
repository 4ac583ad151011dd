//! syslog 输出段渲染
//!
//! 所有 syslog 类型的 sink 汇总进同一个 `[OUTPUT]` 段，
//! 命名空间级与集群级分别序列化为紧凑 JSON 数组。

use crate::diagnostics::Diagnostics;
use crate::sinks::declaration::{canonical_namespace, ClusterLogSink, LogSink, SinkSpec, SinkType};
use crate::sinks::stanza::Stanza;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

/// 序列化失败时的占位内容
pub const EMPTY_JSON_ARRAY: &str = "[]";

/// 交给转发代理的单个 syslog 目标
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SyslogRecord<'a> {
    pub addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsRecord>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub name: &'a str,
}

/// TLS 设置，仅在启用 TLS 时出现
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TlsRecord {
    #[serde(skip_serializing_if = "is_false")]
    pub insecure_skip_verify: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl<'a> SyslogRecord<'a> {
    fn from_spec(spec: &SinkSpec, namespace: Option<&'a str>, name: &'a str) -> Self {
        let tls = spec.enable_tls.then_some(TlsRecord {
            insecure_skip_verify: spec.insecure_skip_verify,
        });
        Self {
            addr: spec.addr(),
            namespace,
            tls,
            name,
        }
    }

    /// 命名空间级 sink 的记录，空命名空间记为 `default`
    pub fn namespaced(sink: &'a LogSink) -> Self {
        Self::from_spec(
            &sink.spec,
            Some(canonical_namespace(&sink.namespace)),
            &sink.name,
        )
    }

    /// 集群级 sink 的记录，不含命名空间
    pub fn cluster(sink: &'a ClusterLogSink) -> Self {
        Self::from_spec(&sink.spec, None, &sink.name)
    }

    // 排序键为 (namespace, name)；规范化后可能重复，余下字段只用于稳定输出
    fn render_order(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.name.cmp(other.name))
            .then_with(|| self.addr.cmp(&other.addr))
            .then_with(|| self.tls.cmp(&other.tls))
    }
}

/// 按确定顺序收集命名空间级 syslog 记录
pub fn namespaced_records<'a>(
    sinks: impl IntoIterator<Item = &'a LogSink>,
) -> Vec<SyslogRecord<'a>> {
    let mut records: Vec<_> = sinks
        .into_iter()
        .filter(|sink| sink.spec.sink_type == SinkType::Syslog)
        .map(SyslogRecord::namespaced)
        .collect();
    records.sort_by(SyslogRecord::render_order);
    records
}

/// 按确定顺序收集集群级 syslog 记录
pub fn cluster_records<'a>(
    sinks: impl IntoIterator<Item = &'a ClusterLogSink>,
) -> Vec<SyslogRecord<'a>> {
    let mut records: Vec<_> = sinks
        .into_iter()
        .filter(|sink| sink.spec.sink_type == SinkType::Syslog)
        .map(SyslogRecord::cluster)
        .collect();
    records.sort_by(SyslogRecord::render_order);
    records
}

/// 序列化记录列表，失败时退化为空数组
pub fn encode_records<T: Serialize>(records: &[T], kind: &str, diagnostics: &Diagnostics) -> String {
    match serde_json::to_string(records) {
        Ok(json) => json,
        Err(e) => {
            diagnostics.increment_serialization_failures();
            warn!(kind, error = %e, "unable to marshal syslog sinks");
            EMPTY_JSON_ARRAY.to_string()
        }
    }
}

/// 渲染 syslog 输出段
///
/// 没有任何 syslog 类型的 sink 时返回 `None`。
pub fn syslog_stanza<'a>(
    sinks: impl IntoIterator<Item = &'a LogSink>,
    cluster_sinks: impl IntoIterator<Item = &'a ClusterLogSink>,
    stats_addr: &str,
    diagnostics: &Diagnostics,
) -> Option<Stanza> {
    let sinks = namespaced_records(sinks);
    let sinks_json = encode_records(&sinks, "sinks", diagnostics);

    let cluster_sinks = cluster_records(cluster_sinks);
    let cluster_sinks_json = encode_records(&cluster_sinks, "cluster sinks", diagnostics);

    if sinks.is_empty() && cluster_sinks.is_empty() {
        return None;
    }

    Some(
        Stanza::output("syslog")
            .entry("Match", "*")
            .entry("StatsAddr", stats_addr)
            .entry("Sinks", sinks_json)
            .entry("ClusterSinks", cluster_sinks_json),
    )
}
