/// Point-in-time view of a loading cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub loads: u64,
    pub load_failures: u64,
    pub reloads: u64, // TTL refreshes performed in place on a hit

    pub expired_evictions: u64,
    pub oldest_evictions: u64,
    pub removes: u64,
    pub clears: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: Option<usize>,
}

impl CacheMetricsSnapshot {
    /// Fraction of `get` calls answered without a miss, in `[0, 1]`.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}
