use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::traits::{LoadingCacheMetricsRecorder, MetricsReset};

/// Atomic counters behind [`CacheMetricsSnapshot`](crate::metrics::snapshot::CacheMetricsSnapshot).
#[derive(Debug, Default)]
pub struct LoadingCacheMetrics {
    pub get_hits: AtomicU64,
    pub get_misses: AtomicU64,
    pub loads: AtomicU64,
    pub load_failures: AtomicU64,
    pub reloads: AtomicU64,
    pub expired_evictions: AtomicU64,
    pub oldest_evictions: AtomicU64,
    pub removes: AtomicU64,
    pub clears: AtomicU64,
}

impl LoadingCacheMetrics {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

impl LoadingCacheMetricsRecorder for LoadingCacheMetrics {
    fn record_get_hit(&self) {
        Self::bump(&self.get_hits);
    }

    fn record_get_miss(&self) {
        Self::bump(&self.get_misses);
    }

    fn record_load(&self) {
        Self::bump(&self.loads);
    }

    fn record_load_failure(&self) {
        Self::bump(&self.load_failures);
    }

    fn record_reload(&self) {
        Self::bump(&self.reloads);
    }

    fn record_expired_eviction(&self, count: u64) {
        self.expired_evictions.fetch_add(count, Ordering::Relaxed);
    }

    fn record_oldest_eviction(&self) {
        Self::bump(&self.oldest_evictions);
    }

    fn record_remove(&self) {
        Self::bump(&self.removes);
    }

    fn record_clear(&self) {
        Self::bump(&self.clears);
    }
}

impl MetricsReset for LoadingCacheMetrics {
    fn reset_metrics(&self) {
        for counter in [
            &self.get_hits,
            &self.get_misses,
            &self.loads,
            &self.load_failures,
            &self.reloads,
            &self.expired_evictions,
            &self.oldest_evictions,
            &self.removes,
            &self.clears,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
