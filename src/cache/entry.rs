//! Cache slot payload: key, value and last-use timestamp.

use std::time::Instant;

/// Entry held by one slot of a [`BoundedCache`](crate::cache::BoundedCache).
///
/// The use timestamp is bumped on every read and on every reload and never
/// decreases, even if callers hand in an older instant than the one already
/// recorded.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    use_timestamp: Instant,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates an entry first used at `now`.
    pub fn new(key: K, value: V, now: Instant) -> Self {
        Self {
            key,
            value,
            use_timestamp: now,
        }
    }

    /// Returns the entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value and records a use at `now`.
    pub fn value_at(&mut self, now: Instant) -> &V {
        self.touch(now);
        &self.value
    }

    /// Returns the value without recording a use.
    #[inline]
    pub fn peek(&self) -> &V {
        &self.value
    }

    /// Replaces the value (reload) and records a use at `now`.
    pub fn set_value(&mut self, value: V, now: Instant) {
        self.value = value;
        self.touch(now);
    }

    /// Returns the instant of the latest use.
    #[inline]
    pub fn use_timestamp(&self) -> Instant {
        self.use_timestamp
    }

    #[inline]
    fn touch(&mut self, now: Instant) {
        self.use_timestamp = self.use_timestamp.max(now);
    }
}
