//! Instrumentation orchestrator.
//!
//! Wraps a driver object graph so that opening, closing and executing any
//! node produces timing samples under a hierarchical name.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────── Instrumenter ────────────────────────────┐
//!   │                                                                      │
//!   │   wrap_*(name, real) ──▶ HandlerCore { delegate, name, lifetime }    │
//!   │                              │                                       │
//!   │                              ▼                                       │
//!   │                  AdapterFactory::new_object(handler, {capability})   │
//!   │                              │                                       │
//!   │   Monitor ◀── timers ── handler ◀── calls ── Proxy ──▶ caller        │
//!   │                              │                                       │
//!   │   sql cache ◀── build_sql_id ┘  (child objects re-enter wrap_*)      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timer names
//!
//! | timer                        | started by                        | stopped by        |
//! |------------------------------|-----------------------------------|-------------------|
//! | `<name>.pooledconn`          | `wrap_pooled_connection` / XA     | `close`           |
//! | `<name>.conn`                | `wrap_connection`                 | `close`           |
//! | `<name>.stmt`                | `wrap_statement`                  | `close`           |
//! | `<name>.<sql id>.stmt`       | `wrap_prepared_statement` / call  | `close`           |
//! | `<name>.<sql id>.exec`       | `execute*`                        | end of the call   |
//! | `<name>.<sql id>.rset`       | `wrap_result_set`                 | `close`           |
//!
//! Statement-level timers get the query text as their note the first time
//! they are used.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use probekit::builder::InstrumenterBuilder;
//! use probekit::monitor::StopwatchRegistry;
//!
//! let registry = Arc::new(StopwatchRegistry::new());
//! let instrumenter = InstrumenterBuilder::new()
//!     .monitor(registry.clone())
//!     .identifier_cache_size(Some(100))
//!     .build();
//! assert_eq!(
//!     instrumenter.build_sql_id("select * from sample"),
//!     "select_d90991bb8c08a7c17c78439f05c47413a4ceb7cb"
//! );
//! ```
//!
//! ## Thread Safety
//!
//! `Instrumenter` is a cheap `Clone` handle over shared state; every handler
//! keeps one so that it can wrap the children it sees.

pub mod handler;

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use crate::cache::Cache;
use crate::driver::{
    CallableStatement, Capability, Connection, DataSource, DriverObject, PooledConnection,
    PreparedStatement, ResultSet, Statement, XaConnection, XaDataSource,
};
use crate::error::AdapterError;
use crate::monitor::{Monitor, TimerHandle};
use crate::proxy::{AdapterFactory, CapabilitySet, Scope};

pub use handler::{
    ConnectionHandler, DataSourceHandler, HandlerCore, InstrumentedHandler,
    PooledConnectionHandler, ResultSetHandler, StatementHandler, StatementKind,
    XaDataSourceHandler,
};

/// Shared identifier cache: raw query text to identifier.
pub type SqlIdCache = Arc<dyn Cache<String, String, Error = Infallible>>;

/// Result-set contracts from most to least specific. A result set is wrapped
/// as the first one it satisfies.
pub const RESULT_SET_PRECEDENCE: [Capability; 7] = [
    Capability::FilteredRowSet,
    Capability::JoinRowSet,
    Capability::WebRowSet,
    Capability::CachedRowSet,
    Capability::JdbcRowSet,
    Capability::RowSet,
    Capability::ResultSet,
];

/// Suffixes of the timers started by the orchestrator.
pub mod suffix {
    pub const POOLED_CONNECTION: &str = "pooledconn";
    pub const CONNECTION: &str = "conn";
    pub const STATEMENT: &str = "stmt";
    pub const EXECUTE: &str = "exec";
    pub const RESULT_SET: &str = "rset";
}

struct Inner {
    monitor: Arc<dyn Monitor>,
    factory: Arc<dyn AdapterFactory>,
    sql_cache: SqlIdCache,
    scope: Scope,
}

/// Factory of instrumented wrappers.
#[derive(Clone)]
pub struct Instrumenter {
    inner: Arc<Inner>,
}

impl Instrumenter {
    pub fn new(
        monitor: Arc<dyn Monitor>,
        factory: Arc<dyn AdapterFactory>,
        sql_cache: SqlIdCache,
    ) -> Self {
        Self::with_scope(monitor, factory, sql_cache, Scope::default())
    }

    /// Like [`new`](Self::new), building adapters in `scope`.
    pub fn with_scope(
        monitor: Arc<dyn Monitor>,
        factory: Arc<dyn AdapterFactory>,
        sql_cache: SqlIdCache,
        scope: Scope,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                monitor,
                factory,
                sql_cache,
                scope,
            }),
        }
    }

    #[inline]
    pub fn monitor(&self) -> &Arc<dyn Monitor> {
        &self.inner.monitor
    }

    #[inline]
    pub fn factory(&self) -> &Arc<dyn AdapterFactory> {
        &self.inner.factory
    }

    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    // -----------------------------------------------------------------------
    // Identifiers and timers
    // -----------------------------------------------------------------------

    /// Identifier of `sql`, served from the identifier cache.
    pub fn build_sql_id(&self, sql: &str) -> String {
        match self.inner.sql_cache.get(&sql.to_owned()) {
            Ok(sql_id) => sql_id,
            Err(never) => match never {},
        }
    }

    fn start_timer(&self, name: &str, suffix: &str) -> TimerHandle {
        self.inner.monitor.start_timer(&format!("{name}.{suffix}"))
    }

    fn start_statement_timer(
        &self,
        name: &str,
        sql: &str,
        sql_id: &str,
        suffix: &str,
    ) -> TimerHandle {
        let timer = self
            .inner
            .monitor
            .named_timer(&format!("{name}.{sql_id}.{suffix}"));
        timer.set_note_if_unset(sql);
        TimerHandle::start(timer)
    }

    /// Starts `<name>.<sql_id>.exec`.
    pub fn start_execute_timer(&self, name: &str, sql: &str, sql_id: &str) -> TimerHandle {
        self.start_statement_timer(name, sql, sql_id, suffix::EXECUTE)
    }

    // -----------------------------------------------------------------------
    // Wrapping
    // -----------------------------------------------------------------------

    fn adapt<H, T>(
        &self,
        handler: H,
        capability: Capability,
        view: Capability,
        cast: fn(&DriverObject) -> Option<Arc<T>>,
    ) -> Result<Arc<T>, AdapterError>
    where
        H: InstrumentedHandler + 'static,
        T: ?Sized,
    {
        let handler = Arc::new(handler);
        let set = CapabilitySet::new(self.inner.scope.clone(), [capability]);
        let adapted = self
            .inner
            .factory
            .new_object(handler.clone(), &set, view)
            .and_then(|object| cast(&object).ok_or(AdapterError::NotInSet(view)));
        if adapted.is_err() {
            handler.core().stop_lifetime();
        }
        adapted
    }

    fn core(
        &self,
        delegate: DriverObject,
        declared: Capability,
        name: &str,
        lifetime: Option<TimerHandle>,
    ) -> HandlerCore {
        HandlerCore::new(delegate, declared, name, lifetime, self.clone())
    }

    /// Wraps a data source. Connections it hands out are wrapped under the
    /// same name.
    pub fn wrap_data_source(
        &self,
        name: &str,
        data_source: Arc<dyn DataSource>,
    ) -> Result<Arc<dyn DataSource>, AdapterError> {
        let core = self.core(
            DriverObject::DataSource(data_source),
            Capability::DataSource,
            name,
            None,
        );
        self.adapt(
            DataSourceHandler::new(core),
            Capability::DataSource,
            Capability::DataSource,
            DriverObject::as_data_source,
        )
    }

    /// Wraps an XA data source.
    pub fn wrap_xa_data_source(
        &self,
        name: &str,
        data_source: Arc<dyn XaDataSource>,
    ) -> Result<Arc<dyn XaDataSource>, AdapterError> {
        let core = self.core(
            DriverObject::XaDataSource(data_source),
            Capability::XaDataSource,
            name,
            None,
        );
        self.adapt(
            XaDataSourceHandler::new(core),
            Capability::XaDataSource,
            Capability::XaDataSource,
            DriverObject::as_xa_data_source,
        )
    }

    /// Wraps a pooled connection and starts `<name>.pooledconn`.
    pub fn wrap_pooled_connection(
        &self,
        name: &str,
        connection: Arc<dyn PooledConnection>,
    ) -> Result<Arc<dyn PooledConnection>, AdapterError> {
        let timer = self.start_timer(name, suffix::POOLED_CONNECTION);
        let core = self.core(
            DriverObject::PooledConnection(connection),
            Capability::PooledConnection,
            name,
            Some(timer),
        );
        self.adapt(
            PooledConnectionHandler::new(core),
            Capability::PooledConnection,
            Capability::PooledConnection,
            DriverObject::as_pooled_connection,
        )
    }

    /// Wraps an XA connection and starts `<name>.pooledconn`.
    pub fn wrap_xa_connection(
        &self,
        name: &str,
        connection: Arc<dyn XaConnection>,
    ) -> Result<Arc<dyn XaConnection>, AdapterError> {
        let timer = self.start_timer(name, suffix::POOLED_CONNECTION);
        let core = self.core(
            DriverObject::XaConnection(connection),
            Capability::XaConnection,
            name,
            Some(timer),
        );
        self.adapt(
            PooledConnectionHandler::new(core),
            Capability::XaConnection,
            Capability::XaConnection,
            DriverObject::as_xa_connection,
        )
    }

    /// Wraps a connection and starts `<name>.conn`.
    pub fn wrap_connection(
        &self,
        name: &str,
        connection: Arc<dyn Connection>,
    ) -> Result<Arc<dyn Connection>, AdapterError> {
        let timer = self.start_timer(name, suffix::CONNECTION);
        let core = self.core(
            DriverObject::Connection(connection),
            Capability::Connection,
            name,
            Some(timer),
        );
        self.adapt(
            ConnectionHandler::new(core),
            Capability::Connection,
            Capability::Connection,
            DriverObject::as_connection,
        )
    }

    /// Wraps a plain statement and starts `<name>.stmt`.
    pub fn wrap_statement(
        &self,
        name: &str,
        statement: Arc<dyn Statement>,
    ) -> Result<Arc<dyn Statement>, AdapterError> {
        let timer = self.start_timer(name, suffix::STATEMENT);
        let core = self.core(
            DriverObject::Statement(statement),
            Capability::Statement,
            name,
            Some(timer),
        );
        self.adapt(
            StatementHandler::new(core, StatementKind::Plain),
            Capability::Statement,
            Capability::Statement,
            DriverObject::as_statement,
        )
    }

    /// Wraps a prepared statement and starts `<name>.<sql id>.stmt`.
    pub fn wrap_prepared_statement(
        &self,
        name: &str,
        statement: Arc<dyn PreparedStatement>,
        sql: &str,
    ) -> Result<Arc<dyn PreparedStatement>, AdapterError> {
        let sql_id = self.build_sql_id(sql);
        let timer = self.start_statement_timer(name, sql, &sql_id, suffix::STATEMENT);
        let core = self.core(
            DriverObject::PreparedStatement(statement),
            Capability::PreparedStatement,
            name,
            Some(timer),
        );
        let kind = StatementKind::Prepared {
            sql: sql.to_owned(),
            sql_id,
        };
        self.adapt(
            StatementHandler::new(core, kind),
            Capability::PreparedStatement,
            Capability::PreparedStatement,
            DriverObject::as_prepared_statement,
        )
    }

    /// Wraps a callable statement and starts `<name>.<sql id>.stmt`.
    pub fn wrap_callable_statement(
        &self,
        name: &str,
        statement: Arc<dyn CallableStatement>,
        sql: &str,
    ) -> Result<Arc<dyn CallableStatement>, AdapterError> {
        let sql_id = self.build_sql_id(sql);
        let timer = self.start_statement_timer(name, sql, &sql_id, suffix::STATEMENT);
        let core = self.core(
            DriverObject::CallableStatement(statement),
            Capability::CallableStatement,
            name,
            Some(timer),
        );
        let kind = StatementKind::Callable {
            sql: sql.to_owned(),
            sql_id,
        };
        self.adapt(
            StatementHandler::new(core, kind),
            Capability::CallableStatement,
            Capability::CallableStatement,
            DriverObject::as_callable_statement,
        )
    }

    /// Wraps a result set as the most specific contract it satisfies and
    /// starts `<name>.<sql id>.rset`.
    ///
    /// The returned handle is typed as a plain result set; the richer views
    /// stay reachable through the `into_*` probes.
    pub fn wrap_result_set(
        &self,
        name: &str,
        rows: Arc<dyn ResultSet>,
        sql: &str,
        sql_id: &str,
    ) -> Result<Arc<dyn ResultSet>, AdapterError> {
        let object = DriverObject::ResultSet(rows);
        let capability = most_specific(&object);
        let delegate = object.narrow(capability).unwrap_or(object);
        let timer = self.start_statement_timer(name, sql, sql_id, suffix::RESULT_SET);
        let core = self.core(delegate, capability, name, Some(timer));
        self.adapt(
            ResultSetHandler::new(core),
            capability,
            Capability::ResultSet,
            DriverObject::as_result_set,
        )
    }
}

/// The most specific result-set contract `rows` satisfies, following
/// [`RESULT_SET_PRECEDENCE`].
pub fn result_set_capability(rows: &Arc<dyn ResultSet>) -> Capability {
    most_specific(&DriverObject::ResultSet(Arc::clone(rows)))
}

fn most_specific(object: &DriverObject) -> Capability {
    RESULT_SET_PRECEDENCE
        .into_iter()
        .find(|capability| object.satisfies(*capability))
        .unwrap_or(Capability::ResultSet)
}

impl fmt::Debug for Instrumenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumenter")
            .field("strategy", &self.inner.factory.strategy())
            .field("scope", &self.inner.scope)
            .field("monitor", &self.inner.monitor)
            .finish()
    }
}
