//! 容器统计信息
//!
//! 计数器由整棵作用域树共享，任意作用域的解析都会累加到同一份统计中。

use std::sync::atomic::{AtomicU64, Ordering};

/// 内部统计计数器（原子）
#[derive(Default)]
pub(crate) struct StatsCounters {
    total_resolutions: AtomicU64,
    scoped_cache_hits: AtomicU64,
    scoped_cache_misses: AtomicU64,
    transient_creations: AtomicU64,
    scoped_creations: AtomicU64,
    scopes_created: AtomicU64,
    scopes_disposed: AtomicU64,
    teardowns_run: AtomicU64,
    teardown_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_resolution(&self) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.scoped_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.scoped_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transient_creation(&self) {
        self.transient_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scoped_creation(&self) {
        self.scoped_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scope_created(&self) {
        self.scopes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scope_disposed(&self) {
        self.scopes_disposed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_teardown(&self, ok: bool) {
        self.teardowns_run.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.teardown_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, registered_services: usize) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            scoped_cache_hits: self.scoped_cache_hits.load(Ordering::Relaxed),
            scoped_cache_misses: self.scoped_cache_misses.load(Ordering::Relaxed),
            transient_creations: self.transient_creations.load(Ordering::Relaxed),
            scoped_creations: self.scoped_creations.load(Ordering::Relaxed),
            scopes_created: self.scopes_created.load(Ordering::Relaxed),
            scopes_disposed: self.scopes_disposed.load(Ordering::Relaxed),
            teardowns_run: self.teardowns_run.load(Ordering::Relaxed),
            teardown_failures: self.teardown_failures.load(Ordering::Relaxed),
            registered_services,
        }
    }
}

/// 容器统计信息快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 总解析次数
    pub total_resolutions: u64,
    /// 作用域缓存命中次数
    pub scoped_cache_hits: u64,
    /// 作用域缓存未命中次数
    pub scoped_cache_misses: u64,
    /// 瞬态服务创建次数
    pub transient_creations: u64,
    /// 作用域服务创建次数
    pub scoped_creations: u64,
    /// 创建的作用域数量（含根作用域）
    pub scopes_created: u64,
    /// 已销毁的作用域数量
    pub scopes_disposed: u64,
    /// 已执行的销毁回调数量
    pub teardowns_run: u64,
    /// 失败的销毁回调数量
    pub teardown_failures: u64,
    /// 服务注册数量
    pub registered_services: usize,
}

impl ContainerStats {
    /// 获取作用域缓存命中率（百分比）
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.scoped_cache_hits + self.scoped_cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.scoped_cache_hits as f64 / total as f64) * 100.0
        }
    }

    /// 仍处于活动状态的作用域数量
    pub fn live_scopes(&self) -> u64 {
        self.scopes_created.saturating_sub(self.scopes_disposed)
    }

    /// 获取性能指标摘要
    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered services, {} live scopes",
            self.total_resolutions,
            self.cache_hit_rate(),
            self.registered_services,
            self.live_scopes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_rate() {
        let empty = ContainerStats::default();
        assert_eq!(empty.cache_hit_rate(), 0.0);

        let stats = ContainerStats {
            scoped_cache_hits: 3,
            scoped_cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.cache_hit_rate(), 75.0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.record_resolution();
        counters.record_resolution();
        counters.record_cache_miss();
        counters.record_scoped_creation();
        counters.record_scope_created();
        counters.record_scope_created();
        counters.record_scope_disposed();
        counters.record_teardown(true);
        counters.record_teardown(false);

        let stats = counters.snapshot(4);
        assert_eq!(stats.total_resolutions, 2);
        assert_eq!(stats.scoped_cache_misses, 1);
        assert_eq!(stats.scoped_creations, 1);
        assert_eq!(stats.live_scopes(), 1);
        assert_eq!(stats.teardowns_run, 2);
        assert_eq!(stats.teardown_failures, 1);
        assert_eq!(stats.registered_services, 4);
        assert!(stats
            .performance_summary()
            .contains("2 total resolutions, 0.0% cache hit rate, 4 registered services, 1 live scopes"));
    }
}
