//! Sink 注册表
//!
//! 保存当前生效的 sink 声明，并按需渲染为转发代理的输出配置。
//! 所有变更与渲染共用同一把互斥锁，渲染总能看到一致的快照。

use crate::config::RegistryConfig;
use crate::diagnostics::Diagnostics;
use crate::sinks::declaration::{
    cluster_sink_key, sink_key, ClusterLogSink, LogSink, SinkDeclaration, SinkType,
};
use crate::sinks::stanza::null_stanza;
use crate::sinks::syslog::syslog_stanza;
use crate::sinks::webhook::webhook_stanzas;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

// 保持插入顺序，替换时原位更新，删除时其余条目顺序不变
#[derive(Debug, Default)]
struct Collections {
    sinks: IndexMap<String, LogSink>,
    cluster_sinks: IndexMap<String, ClusterLogSink>,
}

impl Collections {
    fn unknown_type_count(&self) -> u64 {
        let namespaced = self
            .sinks
            .values()
            .filter(|sink| sink.spec.sink_type == SinkType::Unknown)
            .count();
        let cluster = self
            .cluster_sinks
            .values()
            .filter(|sink| sink.spec.sink_type == SinkType::Unknown)
            .count();
        (namespaced + cluster) as u64
    }
}

/// Sink 注册表
///
/// 在进程启动时创建一次，通过 `Arc` 在监听器与渲染方之间共享。
///
/// # 示例
///
/// ```rust
/// use sink_registry::{LogSink, SinkRegistry, SinkSpec};
///
/// let registry = SinkRegistry::new("127.0.0.1:5000");
/// registry.upsert_sink(LogSink::new("ns1", "app", SinkSpec::webhook("https://example.com/logs")));
///
/// let config = registry.render();
/// assert!(config.contains("Match *_ns1_*"));
/// ```
#[derive(Debug)]
pub struct SinkRegistry {
    stats_addr: String,
    collections: Mutex<Collections>,
    diagnostics: Arc<Diagnostics>,
}

impl SinkRegistry {
    /// 创建空注册表
    ///
    /// # 参数
    ///
    /// * `stats_addr` - 嵌入到 null 段与 syslog 段中的统计地址
    pub fn new(stats_addr: impl Into<String>) -> Self {
        Self {
            stats_addr: stats_addr.into(),
            collections: Mutex::new(Collections::default()),
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    /// 从配置创建注册表
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.stats_addr.clone())
    }

    pub fn stats_addr(&self) -> &str {
        &self.stats_addr
    }

    /// 诊断计数器
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    // 渲染必须是全函数，持锁线程 panic 后仍然继续使用集合
    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 插入或整体替换命名空间级 sink
    pub fn upsert_sink(&self, sink: LogSink) {
        let key = sink.key();
        debug!(key = %key, sink_type = %sink.spec.sink_type, "upsert sink");
        self.lock().sinks.insert(key, sink);
        self.diagnostics.increment_upserts();
    }

    /// 插入或整体替换集群级 sink
    pub fn upsert_cluster_sink(&self, sink: ClusterLogSink) {
        let key = sink.key();
        debug!(key = %key, sink_type = %sink.spec.sink_type, "upsert cluster sink");
        self.lock().cluster_sinks.insert(key, sink);
        self.diagnostics.increment_upserts();
    }

    /// 删除命名空间级 sink，不存在时无操作
    pub fn delete_sink(&self, sink: &LogSink) {
        self.delete_sink_by_key(&sink.namespace, &sink.name);
    }

    /// 删除集群级 sink，不存在时无操作
    pub fn delete_cluster_sink(&self, sink: &ClusterLogSink) {
        self.delete_cluster_sink_by_key(&sink.cluster_name, &sink.name);
    }

    /// 按身份删除命名空间级 sink，返回是否确实删除了条目
    pub fn delete_sink_by_key(&self, namespace: &str, name: &str) -> bool {
        let key = sink_key(namespace, name);
        let removed = self.lock().sinks.shift_remove(&key).is_some();
        debug!(key = %key, removed, "delete sink");
        self.diagnostics.increment_deletes();
        removed
    }

    /// 按身份删除集群级 sink，返回是否确实删除了条目
    pub fn delete_cluster_sink_by_key(&self, cluster_name: &str, name: &str) -> bool {
        let key = cluster_sink_key(cluster_name, name);
        let removed = self.lock().cluster_sinks.shift_remove(&key).is_some();
        debug!(key = %key, removed, "delete cluster sink");
        self.diagnostics.increment_deletes();
        removed
    }

    /// 按作用域分派的 upsert
    pub fn upsert(&self, declaration: SinkDeclaration) {
        match declaration {
            SinkDeclaration::Namespaced(sink) => self.upsert_sink(sink),
            SinkDeclaration::Cluster(sink) => self.upsert_cluster_sink(sink),
        }
    }

    /// 按作用域分派的 delete
    pub fn delete(&self, declaration: &SinkDeclaration) {
        match declaration {
            SinkDeclaration::Namespaced(sink) => self.delete_sink(sink),
            SinkDeclaration::Cluster(sink) => self.delete_cluster_sink(sink),
        }
    }

    /// 命名空间级 sink 数量
    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    /// 集群级 sink 数量
    pub fn cluster_sink_count(&self) -> usize {
        self.lock().cluster_sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        let collections = self.lock();
        collections.sinks.is_empty() && collections.cluster_sinks.is_empty()
    }

    /// 渲染完整的输出配置
    ///
    /// 注册表为空时返回 null 段；否则依次拼接 syslog 段与所有 http 段。
    /// 序列化失败与无法解析的 URL 只体现在诊断计数中，渲染本身不会失败。
    pub fn render(&self) -> String {
        let collections = self.lock();
        self.diagnostics.increment_renders();

        if collections.sinks.is_empty() && collections.cluster_sinks.is_empty() {
            return null_stanza(&self.stats_addr).to_string();
        }

        let unknown = collections.unknown_type_count();
        if unknown > 0 {
            self.diagnostics.add_unknown_type_skipped(unknown);
        }

        let mut config = String::new();
        if let Some(stanza) = syslog_stanza(
            collections.sinks.values(),
            collections.cluster_sinks.values(),
            &self.stats_addr,
            &self.diagnostics,
        ) {
            stanza.write_into(&mut config);
        }

        for stanza in webhook_stanzas(
            collections.sinks.values(),
            collections.cluster_sinks.values(),
            &self.diagnostics,
        ) {
            stanza.write_into(&mut config);
        }

        config
    }
}

impl fmt::Display for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::declaration::SinkSpec;
    use std::thread;

    const STATS_ADDR: &str = "127.0.0.1:5000";

    const NULL_CONFIG: &str = "\n[OUTPUT]\n    Name null\n    Match *\n    StatsAddr 127.0.0.1:5000\n";

    fn syslog_sink(namespace: &str, name: &str) -> LogSink {
        LogSink::new(namespace, name, SinkSpec::syslog("example.com", 514))
    }

    #[test]
    fn test_empty_registry_renders_null_stanza() {
        let registry = SinkRegistry::new(STATS_ADDR);
        assert_eq!(registry.render(), NULL_CONFIG);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_render_is_stable() {
        let registry = SinkRegistry::new(STATS_ADDR);
        for i in 0..20 {
            registry.upsert_sink(syslog_sink(&format!("ns-{i}"), "app"));
            registry.upsert_cluster_sink(ClusterLogSink::new(
                format!("cluster-{i}"),
                SinkSpec::syslog("10.0.0.1", 514),
            ));
        }
        registry.upsert_sink(LogSink::new("ns", "hook", SinkSpec::webhook("https://a.example.com")));

        assert_eq!(registry.render(), registry.render());
    }

    #[test]
    fn test_upsert_then_delete_restores_output() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_sink(syslog_sink("a", "x"));
        let before = registry.render();

        let extra = LogSink::new("b", "hook", SinkSpec::webhook("http://example.com"));
        registry.upsert_sink(extra.clone());
        assert_ne!(registry.render(), before);

        registry.delete_sink(&extra);
        assert_eq!(registry.render(), before);
    }

    #[test]
    fn test_upsert_then_delete_keeps_webhook_order() {
        for round in 0..50 {
            let registry = SinkRegistry::new(STATS_ADDR);
            for i in 0..3 {
                registry.upsert_sink(LogSink::new(
                    format!("ns-{round}-{i}"),
                    "hook",
                    SinkSpec::webhook(format!("http://h{i}.example.com/in")),
                ));
            }
            registry.upsert_cluster_sink(ClusterLogSink::new("all", SinkSpec::webhook("https://c.example.com")));
            let before = registry.render();

            let extra = LogSink::new(format!("ns-{round}-extra"), "hook", SinkSpec::webhook("http://x.example.com"));
            registry.upsert_sink(extra.clone());
            registry.delete_sink(&extra);

            assert_eq!(registry.render(), before);
        }
    }

    #[test]
    fn test_webhooks_render_in_insertion_order() {
        let registry = SinkRegistry::new(STATS_ADDR);
        for host in ["c", "a", "b"] {
            registry.upsert_sink(LogSink::new(host, "hook", SinkSpec::webhook(format!("http://{host}.example.com"))));
        }
        // 替换不改变位置
        registry.upsert_sink(LogSink::new("c", "hook", SinkSpec::webhook("https://c.example.com")));

        let config = registry.render();
        let c = config.find("Host c.example.com").unwrap();
        let a = config.find("Host a.example.com").unwrap();
        let b = config.find("Host b.example.com").unwrap();
        assert!(c < a && a < b);
        assert_eq!(config.matches("tls On").count(), 1);
    }

    #[test]
    fn test_upsert_replaces_whole_declaration() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_sink(LogSink::new(
            "ns",
            "app",
            SinkSpec::syslog("old.example.com", 514).with_tls(true),
        ));
        registry.upsert_sink(syslog_sink("ns", "app"));

        let config = registry.render();
        assert_eq!(registry.sink_count(), 1);
        assert!(config.contains("example.com:514"));
        assert!(!config.contains("old.example.com"));
        assert!(!config.contains("tls"));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.delete_sink(&syslog_sink("ns", "missing"));
        assert!(!registry.delete_cluster_sink_by_key("", "missing"));
        assert_eq!(registry.render(), NULL_CONFIG);
        assert_eq!(registry.diagnostics().snapshot().deletes, 2);
    }

    #[test]
    fn test_delete_cluster_sink() {
        let registry = SinkRegistry::new(STATS_ADDR);
        let sink = ClusterLogSink::new("all", SinkSpec::syslog("h", 514)).with_cluster_name("prod");
        registry.upsert_cluster_sink(sink.clone());
        assert_eq!(registry.cluster_sink_count(), 1);

        // 集群标识不同，不是同一个 sink
        assert!(!registry.delete_cluster_sink_by_key("", "all"));
        registry.delete_cluster_sink(&sink);
        assert_eq!(registry.cluster_sink_count(), 0);
    }

    #[test]
    fn test_syslog_sorted_regardless_of_insertion_order() {
        let forward = SinkRegistry::new(STATS_ADDR);
        forward.upsert_sink(syslog_sink("b", "x"));
        forward.upsert_sink(syslog_sink("a", "y"));

        let reverse = SinkRegistry::new(STATS_ADDR);
        reverse.upsert_sink(syslog_sink("a", "y"));
        reverse.upsert_sink(syslog_sink("b", "x"));

        let config = forward.render();
        assert_eq!(config, reverse.render());
        let a = config.find(r#""namespace":"a""#).unwrap();
        let b = config.find(r#""namespace":"b""#).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_only_webhook_sinks() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_sink(LogSink::new("ns1", "hook", SinkSpec::webhook("https://example.com/path")));

        let config = registry.render();
        assert!(!config.contains("Name syslog"));
        assert!(!config.contains("Name null"));
        assert!(config.contains("Name http"));
        assert!(config.contains("Match *_ns1_*"));
    }

    #[test]
    fn test_syslog_before_webhook() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_cluster_sink(ClusterLogSink::new("hook", SinkSpec::webhook("http://example.com")));
        registry.upsert_sink(syslog_sink("ns", "app"));

        let config = registry.render();
        let syslog = config.find("Name syslog").unwrap();
        let http = config.find("Name http").unwrap();
        assert!(syslog < http);
        assert!(config.contains("    ClusterSinks []\n"));
    }

    #[test]
    fn test_malformed_url_does_not_abort_render() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_sink(LogSink::new("ns", "bad", SinkSpec::webhook("://bad")));
        registry.upsert_sink(LogSink::new("ns", "good", SinkSpec::webhook("http://example.com")));
        registry.upsert_sink(syslog_sink("ns", "app"));

        let config = registry.render();
        assert_eq!(config.matches("Name http").count(), 1);
        assert!(config.contains("Name syslog"));
        assert_eq!(registry.diagnostics().snapshot().malformed_urls, 1);
    }

    #[test]
    fn test_only_unknown_types_render_nothing() {
        let registry = SinkRegistry::new(STATS_ADDR);
        let mut spec = SinkSpec::webhook("http://example.com");
        spec.sink_type = SinkType::Unknown;
        registry.upsert_sink(LogSink::new("ns", "kafka", spec));

        assert_eq!(registry.render(), "");
        assert_eq!(registry.diagnostics().snapshot().unknown_type_skipped, 1);
    }

    #[test]
    fn test_declaration_dispatch() {
        let registry = SinkRegistry::new(STATS_ADDR);
        let decl = SinkDeclaration::from(ClusterLogSink::new("all", SinkSpec::syslog("h", 1)));
        registry.upsert(decl.clone());
        assert_eq!(registry.cluster_sink_count(), 1);
        registry.delete(&decl);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_display_matches_render() {
        let registry = SinkRegistry::new(STATS_ADDR);
        registry.upsert_sink(syslog_sink("", "app"));
        assert_eq!(registry.to_string(), registry.render());
        assert!(registry.render().contains(r#""namespace":"default""#));
    }

    #[test]
    fn test_concurrent_mutation_and_render() {
        let registry = Arc::new(SinkRegistry::new(STATS_ADDR));
        let mut handles = vec![];

        for worker in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let sink = syslog_sink(&format!("ns-{worker}"), &format!("sink-{i}"));
                    registry.upsert_sink(sink.clone());
                    let _ = registry.render();
                    if i % 2 == 0 {
                        registry.delete_sink(&sink);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.sink_count(), 8 * 25);
        assert_eq!(registry.diagnostics().snapshot().upserts, 8 * 50);
    }

    #[test]
    fn test_render_after_poisoned_lock() {
        let registry = Arc::new(SinkRegistry::new(STATS_ADDR));
        registry.upsert_sink(syslog_sink("ns", "app"));
        let expected = registry.render();

        let poisoner = Arc::clone(&registry);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the registry lock");
        })
        .join();

        assert_eq!(registry.render(), expected);
    }
}
