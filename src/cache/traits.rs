//! Loading-cache contracts.
//!
//! A [`Cache`] never exposes an insert operation: values only enter through
//! the [`CacheLoader`] supplied by the cache's owner. All operations take
//! `&self` so a cache can be shared across threads behind an `Arc`.
//!
//! ```text
//!   caller ──get(k)──▶ Cache ──hit──▶ value
//!                        │
//!                        └──miss / expired──▶ CacheLoader::load(k) ──▶ value
//! ```

/// Produces the value for a key on cache miss.
///
/// Loaders may fail; the failure is handed back to the `get` caller
/// unchanged and nothing is stored for that key. Loaders may be invoked more
/// than once for the same key when callers race.
///
/// Any `Fn(&K) -> Result<V, E> + Send + Sync` is a loader:
///
/// ```
/// use std::convert::Infallible;
/// use probekit::cache::CacheLoader;
///
/// let double = |key: &u32| Ok::<_, Infallible>(key * 2);
/// assert_eq!(double.load(&21), Ok(42));
/// ```
pub trait CacheLoader<K, V>: Send + Sync {
    /// Failure raised while loading.
    type Error;

    /// Loads the value corresponding to `key`.
    fn load(&self, key: &K) -> Result<V, Self::Error>;
}

impl<K, V, E, F> CacheLoader<K, V> for F
where
    F: Fn(&K) -> Result<V, E> + Send + Sync,
{
    type Error = E;

    #[inline]
    fn load(&self, key: &K) -> Result<V, E> {
        self(key)
    }
}

/// Key/value cache that fills itself through a loader.
pub trait Cache<K, V>: Send + Sync {
    /// Failure surfaced by [`get`](Cache::get), normally the loader's error.
    type Error;

    /// Returns the value for `key`, loading it when absent or expired.
    fn get(&self, key: &K) -> Result<V, Self::Error>;

    /// Removes the entry for `key`. Absent keys are ignored.
    fn remove(&self, key: &K);

    /// Removes every entry.
    fn remove_all(&self);
}
