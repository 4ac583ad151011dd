//! HTTP (webhook) 输出段渲染
//!
//! 每个 webhook sink 对应一个独立的 `http` 输出段。
//! URL 无法解析的 sink 不产生任何输出。

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::sinks::declaration::{ClusterLogSink, LogSink, SinkType};
use crate::sinks::stanza::Stanza;
use tracing::debug;
use url::{Host, Url};

/// https 目标追加的 TLS 指令
pub const TLS_DIRECTIVE: &str = "tls On";

const HTTPS_DEFAULT_PORT: &str = "443";
const HTTP_DEFAULT_PORT: &str = "80";

/// 解析 webhook 地址
///
/// 渲染时解析失败的 sink 会被静默丢弃；需要提前拒绝这类声明的调用方可以用它校验。
pub fn parse_webhook_url(url: &str) -> Result<Url> {
    Ok(Url::parse(url)?)
}

/// 构建单个 http 输出段
///
/// # 参数
///
/// * `namespace` - sink 所在命名空间，集群级 sink 传空字符串
/// * `url` - webhook 地址
/// * `is_cluster` - 是否为集群级 sink
///
/// # 返回值
///
/// URL 解析失败时返回 `None`。`URI` 使用百分号编码并去掉 `.`/`..` 段后的路径。
pub fn http_stanza(namespace: &str, url: &str, is_cluster: bool) -> Option<Stanza> {
    let raw = url;
    let url = parse_webhook_url(raw).ok()?;

    let port = match url.port() {
        Some(port) => port.to_string(),
        None => match url.scheme() {
            "https" => HTTPS_DEFAULT_PORT.to_string(),
            "http" => HTTP_DEFAULT_PORT.to_string(),
            // `Url` 会省略与协议默认值相同的显式端口
            _ if has_explicit_port(raw) => url
                .port_or_known_default()
                .map(|port| port.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        },
    };

    let path = match url.path() {
        "" => "/",
        path => path,
    };

    let match_pattern = if is_cluster {
        "*".to_string()
    } else {
        format!("*_{namespace}_*")
    };

    let extras = if url.scheme() == "https" {
        TLS_DIRECTIVE
    } else {
        ""
    };

    Some(
        Stanza::output("http")
            .entry("Match", match_pattern)
            .entry("Format", "json")
            .entry("Host", host_name(&url))
            .entry("Port", port)
            .entry("URI", path)
            .line(extras),
    )
}

/// 原始地址的 authority 部分是否带有 `:<数字>` 端口
fn has_explicit_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);
    // IPv6 字面量中的冒号不是端口分隔符
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

/// 不带方括号的主机名，IPv6 字面量同样去掉方括号
fn host_name(url: &Url) -> String {
    match url.host() {
        Some(Host::Ipv6(addr)) => addr.to_string(),
        Some(host) => host.to_string(),
        None => String::new(),
    }
}

/// 渲染所有 webhook 输出段
///
/// 命名空间级在前，集群级在后；各自按集合的迭代顺序输出，不做排序。
pub fn webhook_stanzas<'a>(
    sinks: impl IntoIterator<Item = &'a LogSink>,
    cluster_sinks: impl IntoIterator<Item = &'a ClusterLogSink>,
    diagnostics: &Diagnostics,
) -> Vec<Stanza> {
    let namespaced = sinks
        .into_iter()
        .filter(|sink| sink.spec.sink_type == SinkType::Webhook)
        .map(|sink| (sink.namespace.as_str(), sink.name.as_str(), &sink.spec.url, false));
    let cluster = cluster_sinks
        .into_iter()
        .filter(|sink| sink.spec.sink_type == SinkType::Webhook)
        .map(|sink| ("", sink.name.as_str(), &sink.spec.url, true));

    namespaced
        .chain(cluster)
        .filter_map(|(namespace, name, url, is_cluster)| {
            let stanza = http_stanza(namespace, url, is_cluster);
            if stanza.is_none() {
                diagnostics.increment_malformed_urls();
                debug!(namespace, name, url = url.as_str(), "dropping webhook sink with unparseable url");
            }
            stanza
        })
        .collect()
}
