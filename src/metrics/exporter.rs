use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// This exporter writes in the Prometheus text exposition format so it can be
/// scraped by Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_sample(&self, kind: &str, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        // Export is best effort; a failing sink must not disturb the cache.
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, name: &str, value: u64) {
        self.write_sample("counter", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        self.write_sample("gauge", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<CacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CacheMetricsSnapshot) {
        self.write_counter(&self.metric_name("get_calls_total"), snapshot.get_calls);
        self.write_counter(&self.metric_name("get_hits_total"), snapshot.get_hits);
        self.write_counter(&self.metric_name("get_misses_total"), snapshot.get_misses);
        self.write_counter(&self.metric_name("loads_total"), snapshot.loads);
        self.write_counter(
            &self.metric_name("load_failures_total"),
            snapshot.load_failures,
        );
        self.write_counter(&self.metric_name("reloads_total"), snapshot.reloads);
        self.write_counter(
            &self.metric_name("expired_evictions_total"),
            snapshot.expired_evictions,
        );
        self.write_counter(
            &self.metric_name("oldest_evictions_total"),
            snapshot.oldest_evictions,
        );
        self.write_counter(&self.metric_name("removes_total"), snapshot.removes);
        self.write_counter(&self.metric_name("clears_total"), snapshot.clears);
        self.write_gauge(&self.metric_name("cache_len"), snapshot.cache_len as u64);
        if let Some(capacity) = snapshot.capacity {
            self.write_gauge(&self.metric_name("capacity"), capacity as u64);
        }
    }
}
