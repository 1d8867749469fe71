pub use crate::builder::InstrumenterBuilder;
pub use crate::cache::{BoundedCache, Cache, CacheLoader, Clock, PassthroughCache, SystemClock};
pub use crate::config::InstrumentationConfig;
pub use crate::driver::{
    CallableStatement, Capability, Connection, DataSource, DriverObject, PooledConnection,
    PreparedStatement, ResultSet, Statement, Wrapper, XaConnection, XaDataSource,
};
pub use crate::driver_url::{Driver, DriverUrl, ProxyDriver};
pub use crate::error::{AdapterError, ConfigError, DriverError, DriverResult};
pub use crate::instrument::Instrumenter;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CacheMetricsSnapshot;
pub use crate::monitor::{Monitor, StopwatchRegistry, TimerHandle};
pub use crate::proxy::{AdapterFactory, CapabilitySet, InvocationHandler, SynthesisStrategy};
pub use crate::sql::{SimpleSqlNormalizer, SqlNormalizer};
