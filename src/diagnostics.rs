//! 注册表的内部诊断与指标。
//!
//! 渲染永远不会失败，被降级处理的情况（序列化失败、无法解析的 URL、
//! 未知类型）只能通过这里的计数器观察到。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 内部诊断与指标数据结构。
///
/// 使用原子操作确保线程安全。
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// 创建时间
    start_time: Option<Instant>,

    /// 渲染次数
    renders: AtomicU64,

    /// upsert 次数（命名空间级与集群级之和）
    upserts: AtomicU64,

    /// delete 次数，包括删除不存在的条目
    deletes: AtomicU64,

    /// syslog 数组序列化失败次数
    serialization_failures: AtomicU64,

    /// 因 URL 无法解析而被丢弃的 webhook sink 次数
    malformed_urls: AtomicU64,

    /// 渲染时跳过的未知类型 sink 次数
    unknown_type_skipped: AtomicU64,

    /// 渲染结果写入文件的次数
    output_writes: AtomicU64,
}

/// 诊断数据的快照，用于外部查询。
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsSnapshot {
    /// 运行时间
    pub uptime: Option<Duration>,

    pub renders: u64,

    pub upserts: u64,

    pub deletes: u64,

    pub serialization_failures: u64,

    pub malformed_urls: u64,

    pub unknown_type_skipped: u64,

    pub output_writes: u64,

    /// 降级事件总数（序列化失败 + 丢弃的 URL）
    pub total_degraded: u64,
}

impl Diagnostics {
    /// 创建新的诊断实例。
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn increment_renders(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_upserts(&self) {
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加序列化失败计数。
    pub fn increment_serialization_failures(&self) {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加被丢弃的 webhook sink 计数。
    pub fn increment_malformed_urls(&self) {
        self.malformed_urls.fetch_add(1, Ordering::Relaxed);
    }

    /// 批量增加未知类型计数。
    pub fn add_unknown_type_skipped(&self, count: u64) {
        self.unknown_type_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_output_writes(&self) {
        self.output_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取诊断数据的快照。
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let serialization_failures = self.serialization_failures.load(Ordering::Relaxed);
        let malformed_urls = self.malformed_urls.load(Ordering::Relaxed);

        DiagnosticsSnapshot {
            uptime: self.start_time.map(|start| start.elapsed()),
            renders: self.renders.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            serialization_failures,
            malformed_urls,
            unknown_type_skipped: self.unknown_type_skipped.load(Ordering::Relaxed),
            output_writes: self.output_writes.load(Ordering::Relaxed),
            total_degraded: serialization_failures + malformed_urls,
        }
    }

    /// 重置所有计数器（主要用于测试）。
    pub fn reset(&self) {
        self.renders.store(0, Ordering::Relaxed);
        self.upserts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.serialization_failures.store(0, Ordering::Relaxed);
        self.malformed_urls.store(0, Ordering::Relaxed);
        self.unknown_type_skipped.store(0, Ordering::Relaxed);
        self.output_writes.store(0, Ordering::Relaxed);
    }
}
