//! Driver-entry configuration.
//!
//! Properties are plain string pairs, either handed to the driver directly or
//! embedded in its URL (see [`DriverUrl`](crate::driver_url::DriverUrl)).
//! [`InstrumentationConfig::from_properties`] validates the ones that shape
//! the orchestrator; everything else is passed on to the real driver.
//!
//! | key                             | value                                              |
//! |---------------------------------|----------------------------------------------------|
//! | `probe_synthesis_strategy`      | `reflective` \| `cached_reflective` \| `class_synthesis` |
//! | `probe_identifier_cache_size`   | integer; `<= 0` or absent disables caching         |
//! | `probe_identifier_cache_ttl`    | milliseconds; absent means entries never expire    |
//! | `probe_real_drv`                | name of the real driver                            |
//! | `probe_prefix`                  | display-name prefix, default `probe`               |

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::proxy::SynthesisStrategy;

/// Property keys recognized by the driver entry point.
pub mod keys {
    /// Every instrumentation property starts with this.
    pub const PROPERTY_PREFIX: &str = "probe_";
    pub const SYNTHESIS_STRATEGY: &str = "probe_synthesis_strategy";
    pub const IDENTIFIER_CACHE_SIZE: &str = "probe_identifier_cache_size";
    pub const IDENTIFIER_CACHE_TTL: &str = "probe_identifier_cache_ttl";
    pub const REAL_DRIVER: &str = "probe_real_drv";
    pub const PREFIX: &str = "probe_prefix";

    /// Whether `key` belongs to the instrumentation rather than the real
    /// driver.
    pub fn is_instrumentation_key(key: &str) -> bool {
        key.starts_with(PROPERTY_PREFIX)
    }
}

/// Display-name prefix used when `probe_prefix` is absent.
pub const DEFAULT_PREFIX: &str = "probe";

/// Parsed orchestrator settings.
///
/// Equal configurations build interchangeable orchestrators, so the type is
/// usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentationConfig {
    pub strategy: SynthesisStrategy,
    /// Bound of the identifier cache; `None` disables caching.
    pub cache_size: Option<usize>,
    /// Time-to-live of identifier cache entries.
    pub cache_ttl: Option<Duration>,
    pub prefix: String,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            strategy: SynthesisStrategy::default(),
            cache_size: None,
            cache_ttl: None,
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

impl InstrumentationConfig {
    /// Reads the recognized keys out of `properties`. Unknown keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown strategy, a cache size that is
    /// not an integer, or a TTL that is not a non-negative integer.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use std::time::Duration;
    /// use probekit::config::{keys, InstrumentationConfig};
    ///
    /// let mut props = HashMap::new();
    /// props.insert(keys::IDENTIFIER_CACHE_SIZE.to_string(), "100".to_string());
    /// props.insert(keys::IDENTIFIER_CACHE_TTL.to_string(), "2500".to_string());
    /// let config = InstrumentationConfig::from_properties(&props).unwrap();
    /// assert_eq!(config.cache_size, Some(100));
    /// assert_eq!(config.cache_ttl, Some(Duration::from_millis(2500)));
    /// assert_eq!(config.prefix, "probe");
    /// ```
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let strategy = match properties.get(keys::SYNTHESIS_STRATEGY) {
            Some(raw) => raw.parse()?,
            None => SynthesisStrategy::default(),
        };
        let cache_size = match properties.get(keys::IDENTIFIER_CACHE_SIZE) {
            Some(raw) => parse_cache_size(raw)?,
            None => None,
        };
        let cache_ttl = match properties.get(keys::IDENTIFIER_CACHE_TTL) {
            Some(raw) => Some(parse_ttl(raw)?),
            None => None,
        };
        let prefix = properties
            .get(keys::PREFIX)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PREFIX.to_owned());

        let config = Self {
            strategy,
            cache_size,
            cache_ttl,
            prefix,
        };
        debug!(?config, "parsed instrumentation config");
        Ok(config)
    }
}

fn parse_cache_size(raw: &str) -> Result<Option<usize>, ConfigError> {
    let size: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::new(keys::IDENTIFIER_CACHE_SIZE, raw))?;
    if size <= 0 {
        return Ok(None);
    }
    usize::try_from(size)
        .map(Some)
        .map_err(|_| ConfigError::new(keys::IDENTIFIER_CACHE_SIZE, raw))
}

fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::new(keys::IDENTIFIER_CACHE_TTL, raw))
}
