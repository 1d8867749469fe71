// ==============================================
// LOADING CACHE SEMANTICS (integration)
// ==============================================
//
// Behavior seen through the `Cache` trait object, the way the orchestrator
// consumes caches: TTL refresh, eviction order and loader failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use probekit::cache::{BoundedCache, Cache, ManualClock, PassthroughCache};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadError(String);

fn counting_loader(
    calls: Arc<AtomicUsize>,
) -> impl Fn(&String) -> Result<String, LoadError> + Send + Sync {
    move |key: &String| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if key.starts_with("bad") {
            return Err(LoadError(format!("cannot load {key}")));
        }
        Ok(format!("{key}#{n}"))
    }
}

// ==============================================
// TTL refresh
// ==============================================

mod ttl {
    use super::*;

    #[test]
    fn value_is_reloaded_after_idle_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = ManualClock::new();
        let cache: Arc<dyn Cache<String, String, Error = LoadError>> = Arc::new(
            BoundedCache::with_clock(
                counting_loader(calls.clone()),
                Some(10),
                Some(Duration::from_millis(100)),
                clock.clone(),
            ),
        );
        let key = "k".to_string();

        assert_eq!(cache.get(&key).unwrap(), "k#1");
        clock.advance(Duration::from_millis(60));
        assert_eq!(cache.get(&key).unwrap(), "k#1");
        // the read above refreshed the use timestamp
        clock.advance(Duration::from_millis(60));
        assert_eq!(cache.get(&key).unwrap(), "k#1");

        clock.advance(Duration::from_millis(101));
        assert_eq!(cache.get(&key).unwrap(), "k#2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_reload_keeps_stale_entry() {
        let clock = ManualClock::new();
        let fail = Arc::new(AtomicUsize::new(0));
        let flag = fail.clone();
        let cache = BoundedCache::with_clock(
            move |key: &u32| {
                if flag.load(Ordering::SeqCst) > 0 {
                    Err("backend down")
                } else {
                    Ok(key * 2)
                }
            },
            Some(4),
            Some(Duration::from_millis(10)),
            clock.clone(),
        );
        assert_eq!(cache.get(&1), Ok(2));
        fail.store(1, Ordering::SeqCst);
        clock.advance(Duration::from_millis(11));
        assert_eq!(cache.get(&1), Err("backend down"));
        assert!(cache.contains(&1));

        fail.store(0, Ordering::SeqCst);
        assert_eq!(cache.get(&1), Ok(2));
    }
}

// ==============================================
// Eviction
// ==============================================

mod eviction {
    use super::*;

    #[test]
    fn least_recently_used_goes_when_nothing_expired() {
        let clock = ManualClock::new();
        let cache = BoundedCache::with_clock(
            |key: &u32| Ok::<_, ()>(*key),
            Some(3),
            None,
            clock.clone(),
        );
        for key in [1, 2, 3] {
            cache.get(&key).unwrap();
            clock.advance(Duration::from_millis(1));
        }
        cache.get(&1).unwrap();
        clock.advance(Duration::from_millis(1));

        cache.get(&4).unwrap();
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn bound_is_never_exceeded() {
        let cache = BoundedCache::new(|key: &u64| Ok::<_, ()>(key * key), Some(8), None);
        for key in 0..1_000u64 {
            assert_eq!(cache.get(&(key % 37)), Ok((key % 37) * (key % 37)));
            assert!(cache.len() <= 8);
        }
        assert_eq!(cache.capacity(), Some(8));
    }
}

// ==============================================
// Loader failures and passthrough
// ==============================================

mod failures {
    use super::*;

    #[test]
    fn failure_is_returned_verbatim_and_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = BoundedCache::new(counting_loader(calls.clone()), Some(4), None);
        let key = "bad-key".to_string();
        assert_eq!(cache.get(&key), Err(LoadError("cannot load bad-key".into())));
        assert_eq!(cache.get(&key), Err(LoadError("cannot load bad-key".into())));
        assert!(cache.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn passthrough_loads_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: Arc<dyn Cache<String, String, Error = LoadError>> =
            Arc::new(PassthroughCache::new(counting_loader(calls.clone())));
        let key = "k".to_string();
        assert_eq!(cache.get(&key).unwrap(), "k#1");
        assert_eq!(cache.get(&key).unwrap(), "k#2");
        cache.remove(&key);
        cache.remove_all();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

// ==============================================
// Metrics export
// ==============================================

#[cfg(feature = "metrics")]
mod export {
    use probekit::metrics::exporter::PrometheusTextExporter;
    use probekit::metrics::traits::{MetricsExporter, MetricsReset};

    use super::*;

    #[test]
    fn prometheus_text_reflects_cache_activity() {
        let cache = BoundedCache::new(|key: &u32| Ok::<_, ()>(*key), Some(2), None);
        for key in [1, 1, 2, 3] {
            cache.get(&key).unwrap();
        }

        let exporter = PrometheusTextExporter::new("sqlid", Vec::new());
        exporter.export(&cache.metrics_snapshot());
        let text = String::from_utf8(exporter.into_inner()).unwrap();

        assert!(text.contains("# TYPE sqlid_get_calls_total counter\nsqlid_get_calls_total 4\n"));
        assert!(text.contains("sqlid_get_hits_total 1\n"));
        assert!(text.contains("sqlid_oldest_evictions_total 1\n"));
        assert!(text.contains("# TYPE sqlid_cache_len gauge\nsqlid_cache_len 2\n"));
        assert!(text.contains("sqlid_capacity 2\n"));

        cache.reset_metrics();
        let snapshot = cache.metrics_snapshot();
        assert_eq!(snapshot.get_calls, 0);
        assert_eq!(snapshot.cache_len, 2);
    }
}
