//! # Metrics Trait Hierarchy
//!
//! Separates *recording*, *snapshotting* and *export* into small traits so the
//! cache engine stays free of monitoring concerns.
//!
//! ## Design Goals
//! - **Single responsibility**: recorders only write counters; providers only
//!   read/snapshot; exporters only publish to monitoring systems.
//! - **Shared access**: recorders take `&self` because loading caches are
//!   shared between threads; implementations use atomics.

/// Counters recorded by a loading cache.
pub trait LoadingCacheMetricsRecorder {
    fn record_get_hit(&self);
    fn record_get_miss(&self);
    fn record_load(&self);
    fn record_load_failure(&self);
    fn record_reload(&self);
    fn record_expired_eviction(&self, count: u64);
    fn record_oldest_eviction(&self);
    fn record_remove(&self);
    fn record_clear(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
