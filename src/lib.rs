//! probekit: timing instrumentation for database driver object graphs.
//!
//! Three layers, bottom-up:
//!
//! - [`cache`]: a bounded loading cache with TTL refresh, used for adapter
//!   recipes and query identifiers.
//! - [`proxy`]: forwarding adapters implementing a requested capability set
//!   over an [`InvocationHandler`](proxy::InvocationHandler), built by one of
//!   three interchangeable strategies.
//! - [`instrument`]: handlers that time the lifetime of connections,
//!   statements and result sets, time every execution under a query
//!   identifier, and wrap each child object a wrapped call hands back.
//!
//! [`driver_url`] is the entry point that turns a `jdbc:probe:` URL into an
//! instrumented connection.

pub mod builder;
pub mod cache;
pub mod config;
pub mod driver;
pub mod driver_url;
pub mod error;
pub mod instrument;
pub mod monitor;
pub mod prelude;
pub mod proxy;
pub mod sql;

#[cfg(feature = "metrics")]
pub mod metrics;
