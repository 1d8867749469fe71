//! Driver entry point.
//!
//! An instrumented connection is requested with a URL that names the real
//! driver and may carry instrumentation properties:
//!
//! ```text
//!   jdbc:probe:h2:mem:test;probe_prefix=svc;MODE=PostgreSQL
//!   └─ prefix ─┘└┬┘└──────────────── rest ─────────────────┘
//!             driver
//!
//!   real URL:   jdbc:h2:mem:test;MODE=PostgreSQL
//!   properties: probe_prefix=svc
//! ```
//!
//! [`ProxyDriver`] resolves the real [`Driver`], connects through it and
//! hands back the connection wrapped by an [`Instrumenter`] built from the
//! URL's properties.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::builder::InstrumenterBuilder;
use crate::config::{DEFAULT_PREFIX, InstrumentationConfig, keys};
use crate::driver::Connection;
use crate::error::{ConfigError, DriverError, DriverResult};
use crate::instrument::Instrumenter;
use crate::monitor::{Monitor, StopwatchRegistry};

/// URL prefix accepted by [`ProxyDriver`].
pub const URL_PREFIX: &str = "jdbc:probe:";

/// SQL state reported when no driver can serve a URL.
pub const NO_SUITABLE_DRIVER: &str = "08001";

// ---------------------------------------------------------------------------
// DriverUrl
// ---------------------------------------------------------------------------

/// A parsed instrumented-driver URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverUrl {
    url: String,
    real_url: String,
    driver_id: String,
    properties: HashMap<String, String>,
}

impl DriverUrl {
    /// Parses `url`, stripping `url_prefix` when present.
    ///
    /// `;key=value` tokens whose key starts with `probe_` move from the URL
    /// into the properties, unless `properties` already sets that key.
    ///
    /// # Errors
    ///
    /// Fails when no driver id can be found, i.e. the rest of the URL has no
    /// `:`.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use probekit::driver_url::{DriverUrl, URL_PREFIX};
    ///
    /// let url = DriverUrl::parse(
    ///     URL_PREFIX,
    ///     "jdbc:probe:h2:mem:test;probe_prefix=svc;MODE=PostgreSQL",
    ///     &HashMap::new(),
    /// )
    /// .unwrap();
    /// assert_eq!(url.driver_id(), "h2");
    /// assert_eq!(url.real_url(), "jdbc:h2:mem:test;MODE=PostgreSQL");
    /// assert_eq!(url.prefix(), "svc");
    /// ```
    pub fn parse(
        url_prefix: &str,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let rest = url.strip_prefix(url_prefix).unwrap_or(url);
        let (driver_id, end) = rest
            .split_once(':')
            .ok_or_else(|| ConfigError::new("url", url))?;

        let mut merged = properties.clone();
        let mut kept = Vec::new();
        for token in end.split(';').filter(|token| !token.is_empty()) {
            if let Some((key, value)) = token.trim().split_once('=') {
                let key = key.trim();
                if keys::is_instrumentation_key(key) && !properties.contains_key(key) {
                    merged.insert(key.to_owned(), value.trim().to_owned());
                    continue;
                }
            }
            kept.push(token);
        }

        Ok(Self {
            url: url.to_owned(),
            real_url: format!("jdbc:{driver_id}:{}", kept.join(";")),
            driver_id: driver_id.to_owned(),
            properties: merged,
        })
    }

    /// The URL as given.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL to hand to the real driver.
    pub fn real_url(&self) -> &str {
        &self.real_url
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    /// Name of the real driver, when set with `probe_real_drv`.
    pub fn real_driver(&self) -> Option<&str> {
        self.property(keys::REAL_DRIVER)
    }

    /// Display-name prefix, `probe` unless set with `probe_prefix`.
    pub fn prefix(&self) -> &str {
        self.property(keys::PREFIX).unwrap_or(DEFAULT_PREFIX)
    }

    /// All properties, instrumentation ones included.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Properties meant for the real driver.
    pub fn real_properties(&self) -> HashMap<String, String> {
        self.properties
            .iter()
            .filter(|(key, _)| !keys::is_instrumentation_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// A real driver the proxy can delegate to.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Name used by `probe_real_drv`.
    fn name(&self) -> &str;

    fn accepts_url(&self, url: &str) -> bool;

    fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> DriverResult<Arc<dyn Connection>>;
}

// ---------------------------------------------------------------------------
// ProxyDriver
// ---------------------------------------------------------------------------

/// Driver that connects through a registered real driver and instruments
/// the connection.
///
/// Instrumenters are shared between connections opened with the same
/// configuration, so their adapter recipes and identifier caches are reused.
pub struct ProxyDriver {
    url_prefix: String,
    monitor: Arc<dyn Monitor>,
    drivers: RwLock<Vec<Arc<dyn Driver>>>,
    instrumenters: Mutex<FxHashMap<InstrumentationConfig, Instrumenter>>,
}

impl ProxyDriver {
    pub fn new(monitor: Arc<dyn Monitor>) -> Self {
        Self::with_url_prefix(monitor, URL_PREFIX)
    }

    pub fn with_url_prefix(monitor: Arc<dyn Monitor>, url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            monitor,
            drivers: RwLock::new(Vec::new()),
            instrumenters: Mutex::new(FxHashMap::default()),
        }
    }

    /// Makes `driver` available for delegation.
    pub fn register(&self, driver: Arc<dyn Driver>) {
        debug!(driver = driver.name(), "registered real driver");
        self.drivers.write().push(driver);
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn monitor(&self) -> &Arc<dyn Monitor> {
        &self.monitor
    }

    /// Number of distinct configurations seen so far.
    pub fn instrumenter_count(&self) -> usize {
        self.instrumenters.lock().len()
    }

    fn real_driver(&self, url: &DriverUrl) -> DriverResult<Arc<dyn Driver>> {
        let drivers = self.drivers.read();
        let found = match url.real_driver() {
            Some(name) => drivers.iter().find(|driver| driver.name() == name),
            None => drivers.iter().find(|driver| driver.accepts_url(url.real_url())),
        };
        found.cloned().ok_or_else(|| {
            DriverError::sql(
                format!("no suitable driver for {}", url.real_url()),
                Some(NO_SUITABLE_DRIVER),
            )
        })
    }

    fn instrumenter(&self, config: &InstrumentationConfig) -> Instrumenter {
        self.instrumenters
            .lock()
            .entry(config.clone())
            .or_insert_with(|| {
                debug!(?config, "building instrumenter");
                InstrumenterBuilder::from_config(config)
                    .monitor(Arc::clone(&self.monitor))
                    .build()
            })
            .clone()
    }
}

impl Default for ProxyDriver {
    fn default() -> Self {
        Self::new(Arc::new(StopwatchRegistry::new()))
    }
}

impl Driver for ProxyDriver {
    fn name(&self) -> &str {
        "probe"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(&self.url_prefix)
    }

    /// Connects through the real driver and wraps the connection under the
    /// configured prefix.
    fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> DriverResult<Arc<dyn Connection>> {
        if !self.accepts_url(url) {
            return Err(DriverError::sql(
                format!("not an instrumented URL: {url}"),
                Some(NO_SUITABLE_DRIVER),
            ));
        }
        let url = DriverUrl::parse(&self.url_prefix, url, properties)?;
        let config = InstrumentationConfig::from_properties(url.properties())?;
        let driver = self.real_driver(&url)?;
        debug!(
            driver = driver.name(),
            real_url = url.real_url(),
            prefix = %config.prefix,
            "connecting"
        );
        let connection = driver.connect(url.real_url(), &url.real_properties())?;
        let instrumenter = self.instrumenter(&config);
        Ok(instrumenter.wrap_connection(&config.prefix, connection)?)
    }
}

impl fmt::Debug for ProxyDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDriver")
            .field("url_prefix", &self.url_prefix)
            .field("drivers", &self.drivers.read().len())
            .field("instrumenters", &self.instrumenter_count())
            .finish()
    }
}
