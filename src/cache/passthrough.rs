//! Cache that stores nothing.

use std::fmt;
use std::marker::PhantomData;

use crate::cache::traits::{Cache, CacheLoader};

/// [`Cache`] that calls its loader on every `get` and never stores.
///
/// Used where caching is switched off (an identifier cache size of zero or
/// less). `remove` and `remove_all` have nothing to do.
pub struct PassthroughCache<K, V, L> {
    loader: L,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K, V, L> PassthroughCache<K, V, L>
where
    L: CacheLoader<K, V>,
{
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            _marker: PhantomData,
        }
    }
}

impl<K, V, L> Cache<K, V> for PassthroughCache<K, V, L>
where
    L: CacheLoader<K, V>,
{
    type Error = L::Error;

    #[inline]
    fn get(&self, key: &K) -> Result<V, L::Error> {
        self.loader.load(key)
    }

    fn remove(&self, _key: &K) {}

    fn remove_all(&self) {}
}

impl<K, V, L> fmt::Debug for PassthroughCache<K, V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughCache").finish_non_exhaustive()
    }
}
