//! Fluent construction of an [`Instrumenter`].
//!
//! Hides how the identifier cache is assembled: no size gives a
//! [`PassthroughCache`], a size gives a [`BoundedCache`] with the optional
//! TTL. Both sit on a [`SqlIdLoader`] over the configured normalizer.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use probekit::builder::InstrumenterBuilder;
//! use probekit::monitor::StopwatchRegistry;
//! use probekit::proxy::SynthesisStrategy;
//!
//! let instrumenter = InstrumenterBuilder::new()
//!     .monitor(Arc::new(StopwatchRegistry::new()))
//!     .strategy(SynthesisStrategy::ClassSynthesis)
//!     .identifier_cache_size(Some(512))
//!     .identifier_cache_ttl(Some(Duration::from_secs(60)))
//!     .try_build()
//!     .unwrap();
//! assert_eq!(instrumenter.factory().strategy(), SynthesisStrategy::ClassSynthesis);
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{BoundedCache, PassthroughCache};
use crate::config::{InstrumentationConfig, keys};
use crate::error::ConfigError;
use crate::instrument::{Instrumenter, SqlIdCache};
use crate::monitor::{Monitor, StopwatchRegistry};
use crate::proxy::{AdapterFactory, Scope, SynthesisStrategy};
use crate::sql::{SimpleSqlNormalizer, SqlIdLoader, SqlNormalizer};

/// Builder for [`Instrumenter`].
#[derive(Debug, Clone)]
pub struct InstrumenterBuilder {
    monitor: Option<Arc<dyn Monitor>>,
    strategy: SynthesisStrategy,
    factory: Option<Arc<dyn AdapterFactory>>,
    normalizer: Arc<dyn SqlNormalizer>,
    cache_size: Option<usize>,
    cache_ttl: Option<Duration>,
    scope: Scope,
}

impl Default for InstrumenterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumenterBuilder {
    /// Reflective adapters, no identifier caching, a private
    /// [`StopwatchRegistry`] unless a monitor is supplied.
    pub fn new() -> Self {
        Self {
            monitor: None,
            strategy: SynthesisStrategy::default(),
            factory: None,
            normalizer: Arc::new(SimpleSqlNormalizer),
            cache_size: None,
            cache_ttl: None,
            scope: Scope::default(),
        }
    }

    /// Starts from parsed driver configuration.
    pub fn from_config(config: &InstrumentationConfig) -> Self {
        Self::new()
            .strategy(config.strategy)
            .identifier_cache_size(config.cache_size)
            .identifier_cache_ttl(config.cache_ttl)
    }

    pub fn monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn strategy(mut self, strategy: SynthesisStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Uses `factory` as is; overrides [`strategy`](Self::strategy).
    pub fn factory(mut self, factory: Arc<dyn AdapterFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn SqlNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Bound of the identifier cache. `None` turns caching off.
    pub fn identifier_cache_size(mut self, size: Option<usize>) -> Self {
        self.cache_size = size;
        self
    }

    /// Time-to-live of identifier cache entries.
    pub fn identifier_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Builds the instrumenter.
    ///
    /// # Errors
    ///
    /// Rejects an identifier cache size of `Some(0)`; use `None` to turn
    /// caching off.
    pub fn try_build(self) -> Result<Instrumenter, ConfigError> {
        if self.cache_size == Some(0) {
            return Err(ConfigError::new(keys::IDENTIFIER_CACHE_SIZE, "0"));
        }
        Ok(self.build())
    }

    /// Builds the instrumenter, treating a cache size of zero as "off".
    pub fn build(self) -> Instrumenter {
        let loader = SqlIdLoader::new(self.normalizer);
        let sql_cache: SqlIdCache = match self.cache_size.filter(|size| *size > 0) {
            Some(size) => Arc::new(BoundedCache::new(loader, Some(size), self.cache_ttl)),
            None => Arc::new(PassthroughCache::new(loader)),
        };
        let monitor = self
            .monitor
            .unwrap_or_else(|| Arc::new(StopwatchRegistry::new()));
        let factory = self.factory.unwrap_or_else(|| self.strategy.factory());
        Instrumenter::with_scope(monitor, factory, sql_cache, self.scope)
    }
}
