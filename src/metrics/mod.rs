//! Observability for the loading caches.
//!
//! Recording, snapshotting and export are kept apart so that cache code only
//! ever increments counters:
//!
//! ```text
//!   BoundedCache ──record_*──▶ LoadingCacheMetrics (atomics)
//!                                     │
//!                     MetricsSnapshotProvider::snapshot()
//!                                     ▼
//!                             CacheMetricsSnapshot ──▶ MetricsExporter
//! ```

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
