//! Size- and TTL-bounded loading cache.
//!
//! ## Architecture
//!
//! ```text
//!   get(k)
//!     │
//!     ├─ map.read() ──hit──▶ slot.lock() ──fresh──▶ bump use_timestamp, return value
//!     │                          │
//!     │                          └─expired──▶ loader.load(k), replace value in place
//!     │
//!     └─miss──▶ fill.lock()  (one cache-wide section, serializes all misses)
//!                 ├─ re-check map (another thread may have filled k)
//!                 ├─ at size bound? evict: drop every expired entry,
//!                 │                 else drop the single oldest entry
//!                 └─ loader.load(k), insert
//! ```
//!
//! ## Key Components
//!
//! - [`BoundedCache`]: the cache. Entries live in `RwLock<FxHashMap<K, Slot>>`
//!   where each slot is an `Arc<Mutex<CacheEntry>>`, so the per-entry
//!   staleness check does not hold the map lock.
//!
//! ## Eviction
//!
//! Eviction runs only on a miss while the cache is at its size bound. It is
//! expire-first, LRU-fallback: all entries idle for longer than the TTL go at
//! once; when none qualify (or no TTL is set) only the least recently used
//! entry goes.
//!
//! ## Thread Safety
//!
//! `BoundedCache` is `Send + Sync` when its key, value, loader and clock are.
//! Loader calls for misses are serialized; a TTL reload runs inside that
//! entry's section only.
//!
//! ## Example Usage
//!
//! ```
//! use std::convert::Infallible;
//! use probekit::cache::{BoundedCache, Cache};
//!
//! let cache = BoundedCache::new(|k: &u32| Ok::<_, Infallible>(k * 10), Some(2), None);
//! assert_eq!(cache.get(&1), Ok(10));
//! assert_eq!(cache.get(&2), Ok(20));
//! assert_eq!(cache.get(&3), Ok(30));
//! assert_eq!(cache.len(), 2);
//! assert!(!cache.contains(&1));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::CacheEntry;
use crate::cache::traits::{Cache, CacheLoader};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LoadingCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{LoadingCacheMetricsRecorder, MetricsReset, MetricsSnapshotProvider};

type Slot<K, V> = Arc<Mutex<CacheEntry<K, V>>>;

/// Loading cache with an optional entry bound and an optional idle TTL.
///
/// `size = None` and `ttl = None` give an unbounded memoizing cache.
/// `size = Some(0)` never stores anything: every `get` calls the loader.
pub struct BoundedCache<K, V, L, C = SystemClock> {
    map: RwLock<FxHashMap<K, Slot<K, V>>>,
    fill: Mutex<()>,
    loader: L,
    size: Option<usize>,
    ttl: Option<Duration>,
    clock: C,
    #[cfg(feature = "metrics")]
    metrics: LoadingCacheMetrics,
}

impl<K, V, L> BoundedCache<K, V, L, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: CacheLoader<K, V>,
{
    /// Creates a cache reading the system clock.
    pub fn new(loader: L, size: Option<usize>, ttl: Option<Duration>) -> Self {
        Self::with_clock(loader, size, ttl, SystemClock)
    }
}

impl<K, V, L, C> BoundedCache<K, V, L, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: CacheLoader<K, V>,
    C: Clock,
{
    /// Creates a cache reading time from `clock`.
    pub fn with_clock(loader: L, size: Option<usize>, ttl: Option<Duration>, clock: C) -> Self {
        let initial = size.unwrap_or(0).min(1024);
        Self {
            map: RwLock::new(FxHashMap::with_capacity_and_hasher(
                initial,
                Default::default(),
            )),
            fill: Mutex::new(()),
            loader,
            size,
            ttl,
            clock,
            #[cfg(feature = "metrics")]
            metrics: LoadingCacheMetrics::default(),
        }
    }

    /// Returns the value for `key`, loading it on a miss or after expiry.
    ///
    /// A loader failure is returned unchanged; nothing is stored for `key`
    /// (on a TTL reload the stale entry is left as it was).
    pub fn get(&self, key: &K) -> Result<V, L::Error> {
        let now = self.clock.now();
        let slot = self.map.read().get(key).cloned();
        if let Some(slot) = slot {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            return self.refresh(key, &slot, now);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_miss();
        self.fill(key)
    }

    /// Returns the configured entry bound.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.size
    }

    /// Returns the configured idle TTL.
    #[inline]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Number of entries currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Whether an entry is stored for `key`. Does not count as a use.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    /// Removes the entry for `key`, if any.
    pub fn remove(&self, key: &K) {
        let removed = self.map.write().remove(key);
        #[cfg(feature = "metrics")]
        if removed.is_some() {
            self.metrics.record_remove();
        }
        drop(removed);
    }

    /// Removes every entry.
    pub fn remove_all(&self) {
        self.map.write().clear();
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn is_expired(&self, use_timestamp: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(use_timestamp) > ttl,
            None => false,
        }
    }

    /// Hit path: per-entry staleness check, reload in place when expired.
    fn refresh(&self, key: &K, slot: &Slot<K, V>, now: Instant) -> Result<V, L::Error> {
        let mut entry = slot.lock();
        if !self.is_expired(entry.use_timestamp(), now) {
            return Ok(entry.value_at(now).clone());
        }

        let value = self.load(key)?;
        entry.set_value(value.clone(), now);
        #[cfg(feature = "metrics")]
        self.metrics.record_reload();
        trace!("reloaded expired cache entry");
        Ok(value)
    }

    /// Miss path: evict if at the bound, then load and insert.
    fn fill(&self, key: &K) -> Result<V, L::Error> {
        let _section = self.fill.lock();
        let now = self.clock.now();

        let slot = self.map.read().get(key).cloned();
        if let Some(slot) = slot {
            return self.refresh(key, &slot, now);
        }

        if let Some(size) = self.size {
            if size == 0 {
                return self.load(key);
            }
            if self.map.read().len() >= size {
                self.evict(now);
            }
        }

        let value = self.load(key)?;
        let entry = CacheEntry::new(key.clone(), value.clone(), now);
        self.map
            .write()
            .insert(key.clone(), Arc::new(Mutex::new(entry)));
        Ok(value)
    }

    fn load(&self, key: &K) -> Result<V, L::Error> {
        let loaded = self.loader.load(key);
        #[cfg(feature = "metrics")]
        match &loaded {
            Ok(_) => self.metrics.record_load(),
            Err(_) => self.metrics.record_load_failure(),
        }
        loaded
    }

    /// Drops all expired entries; if there were none, drops the oldest one.
    fn evict(&self, now: Instant) {
        let mut map = self.map.write();
        let before = map.len();
        if self.ttl.is_some() {
            map.retain(|_, slot| !self.is_expired(slot.lock().use_timestamp(), now));
        }

        let expired = before - map.len();
        if expired > 0 {
            #[cfg(feature = "metrics")]
            self.metrics.record_expired_eviction(expired as u64);
            trace!(expired, "evicted expired cache entries");
            return;
        }

        let oldest = map
            .iter()
            .min_by_key(|(_, slot)| slot.lock().use_timestamp())
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            map.remove(&key);
            #[cfg(feature = "metrics")]
            self.metrics.record_oldest_eviction();
            trace!("evicted least recently used cache entry");
        }
    }
}

impl<K, V, L, C> Cache<K, V> for BoundedCache<K, V, L, C>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
    L: CacheLoader<K, V>,
    C: Clock,
{
    type Error = L::Error;

    #[inline]
    fn get(&self, key: &K) -> Result<V, L::Error> {
        BoundedCache::get(self, key)
    }

    fn remove(&self, key: &K) {
        BoundedCache::remove(self, key)
    }

    fn remove_all(&self) {
        BoundedCache::remove_all(self)
    }
}

#[cfg(feature = "metrics")]
impl<K, V, L, C> MetricsSnapshotProvider<CacheMetricsSnapshot> for BoundedCache<K, V, L, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: CacheLoader<K, V>,
    C: Clock,
{
    fn snapshot(&self) -> CacheMetricsSnapshot {
        let read = LoadingCacheMetrics::read;
        let get_hits = read(&self.metrics.get_hits);
        let get_misses = read(&self.metrics.get_misses);
        CacheMetricsSnapshot {
            get_calls: get_hits + get_misses,
            get_hits,
            get_misses,
            loads: read(&self.metrics.loads),
            load_failures: read(&self.metrics.load_failures),
            reloads: read(&self.metrics.reloads),
            expired_evictions: read(&self.metrics.expired_evictions),
            oldest_evictions: read(&self.metrics.oldest_evictions),
            removes: read(&self.metrics.removes),
            clears: read(&self.metrics.clears),
            cache_len: self.len(),
            capacity: self.size,
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, L, C> BoundedCache<K, V, L, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: CacheLoader<K, V>,
    C: Clock,
{
    /// Point-in-time copy of the cache counters.
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.snapshot()
    }
}

#[cfg(feature = "metrics")]
impl<K, V, L, C> MetricsReset for BoundedCache<K, V, L, C> {
    fn reset_metrics(&self) {
        self.metrics.reset_metrics();
    }
}

impl<K, V, L, C> fmt::Debug for BoundedCache<K, V, L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.map.read().len())
            .field("size", &self.size)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
