//! Per-kind interception handlers.
//!
//! Every handler shares a [`HandlerCore`]: the real object, the capability it
//! was wrapped as, the display name and an optional lifetime timer. On top of
//! that each kind decides which calls it times, which calls hand back a child
//! that must be wrapped, and which calls pass through untouched.
//!
//! ```text
//!   DataSource ──get_connection──▶ Connection ──create_statement──▶ Statement
//!       │                              │        prepare_statement    │
//!   XaDataSource ──get_xa_connection──▶ PooledConnection             │ execute*
//!                                       (Xa)  ──get_connection──▶    ▼
//!                                                                ResultSet family
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::driver::{Capability, DriverObject, Value};
use crate::error::{DriverError, DriverResult};
use crate::instrument::Instrumenter;
use crate::monitor::TimerHandle;
use crate::proxy::{Invocation, InvocationFilter, InvocationHandler};

// ---------------------------------------------------------------------------
// HandlerCore
// ---------------------------------------------------------------------------

/// State common to all handlers.
pub struct HandlerCore {
    delegate: DriverObject,
    declared: Capability,
    name: String,
    lifetime: Option<TimerHandle>,
    instrumenter: Instrumenter,
}

impl HandlerCore {
    pub(crate) fn new(
        delegate: DriverObject,
        declared: Capability,
        name: &str,
        lifetime: Option<TimerHandle>,
        instrumenter: Instrumenter,
    ) -> Self {
        Self {
            delegate,
            declared,
            name: name.to_owned(),
            lifetime,
            instrumenter,
        }
    }

    /// The real object.
    #[inline]
    pub fn delegate(&self) -> &DriverObject {
        &self.delegate
    }

    /// The capability the object was wrapped as.
    #[inline]
    pub fn declared(&self) -> Capability {
        self.declared
    }

    /// Display name used as the timer-name root.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn lifetime(&self) -> Option<&TimerHandle> {
        self.lifetime.as_ref()
    }

    /// Stops the lifetime timer, if any. Later calls have no effect.
    pub(crate) fn stop_lifetime(&self) {
        if let Some(timer) = &self.lifetime {
            timer.stop();
        }
    }

    /// The wrapper answers for its own declared capability; anything else is
    /// up to the real object.
    fn is_wrapper_for(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        if invocation.arg_capability(0)? == self.declared {
            return Ok(Value::Bool(true));
        }
        invocation.proceed()
    }

    /// Unwrapping to the declared capability yields the real object, or what
    /// the real object itself wraps when it is a wrapper too.
    fn unwrap_to(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        let capability = invocation.arg_capability(0)?;
        if capability != self.declared {
            return invocation.proceed();
        }
        if self.delegate.is_wrapper_for(capability)? {
            self.delegate.unwrap_to(capability).map(Value::Object)
        } else {
            Ok(Value::Object(self.delegate.clone()))
        }
    }

    /// Stops the lifetime timer, then closes the real object.
    fn close(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        self.stop_lifetime();
        invocation.proceed()
    }

    /// Handles the wrapper protocol and `close`. Any other call is handed
    /// back untouched.
    fn common<'a>(
        &self,
        invocation: Invocation<'a>,
    ) -> Result<DriverResult<Value>, Invocation<'a>> {
        match invocation.method_name() {
            "is_wrapper_for" => Ok(self.is_wrapper_for(invocation)),
            "unwrap_to" => Ok(self.unwrap_to(invocation)),
            "close" => Ok(self.close(invocation)),
            _ => Err(invocation),
        }
    }
}

impl fmt::Debug for HandlerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCore")
            .field("declared", &self.declared)
            .field("name", &self.name)
            .field("delegate", &self.delegate)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Handlers built by the [`Instrumenter`].
pub trait InstrumentedHandler: InvocationHandler {
    fn core(&self) -> &HandlerCore;
}

fn child<T: ?Sized>(
    value: Value,
    method: &'static str,
    view: fn(&DriverObject) -> Option<Arc<T>>,
    expected: &'static str,
) -> DriverResult<Arc<T>> {
    view(&value.into_object(method)?).ok_or(DriverError::TypeMismatch { method, expected })
}

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

const DATA_SOURCE_CALLS: InvocationFilter = InvocationFilter::Names(&["get_connection"]);
const XA_DATA_SOURCE_CALLS: InvocationFilter = InvocationFilter::Names(&["get_xa_connection"]);

/// Wraps every connection handed out by a data source.
#[derive(Debug)]
pub struct DataSourceHandler {
    core: HandlerCore,
}

impl DataSourceHandler {
    pub(crate) fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl InvocationHandler for DataSourceHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &DATA_SOURCE_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        if invocation.method_name() != "get_connection" {
            return invocation.proceed();
        }
        let method = invocation.method_name();
        let connection = invocation.proceed()?;
        let connection = child(connection, method, DriverObject::as_connection, "Connection")?;
        trace!(name = self.core.name(), "wrapping data source connection");
        let wrapped = self.core.instrumenter.wrap_connection(self.core.name(), connection)?;
        Ok(Value::Object(DriverObject::Connection(wrapped)))
    }
}

impl InstrumentedHandler for DataSourceHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

/// Wraps every XA connection handed out by an XA data source.
#[derive(Debug)]
pub struct XaDataSourceHandler {
    core: HandlerCore,
}

impl XaDataSourceHandler {
    pub(crate) fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl InvocationHandler for XaDataSourceHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &XA_DATA_SOURCE_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        if invocation.method_name() != "get_xa_connection" {
            return invocation.proceed();
        }
        let method = invocation.method_name();
        let connection = invocation.proceed()?;
        let connection = child(
            connection,
            method,
            DriverObject::as_xa_connection,
            "XAConnection",
        )?;
        trace!(name = self.core.name(), "wrapping XA connection");
        let wrapped = self
            .core
            .instrumenter
            .wrap_xa_connection(self.core.name(), connection)?;
        Ok(Value::Object(DriverObject::XaConnection(wrapped)))
    }
}

impl InstrumentedHandler for XaDataSourceHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

// ---------------------------------------------------------------------------
// Pooled and XA connections
// ---------------------------------------------------------------------------

const POOLED_CONNECTION_CALLS: InvocationFilter =
    InvocationFilter::Names(&["get_connection", "close"]);

/// Handler for pooled and XA connections: wraps the logical connections they
/// hand out and ends the `.pooledconn` lifetime timer on close.
#[derive(Debug)]
pub struct PooledConnectionHandler {
    core: HandlerCore,
}

impl PooledConnectionHandler {
    pub(crate) fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl InvocationHandler for PooledConnectionHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &POOLED_CONNECTION_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        match invocation.method_name() {
            "get_connection" => {
                let method = invocation.method_name();
                let connection = invocation.proceed()?;
                let connection =
                    child(connection, method, DriverObject::as_connection, "Connection")?;
                trace!(name = self.core.name(), "wrapping pooled logical connection");
                let wrapped = self
                    .core
                    .instrumenter
                    .wrap_connection(self.core.name(), connection)?;
                Ok(Value::Object(DriverObject::Connection(wrapped)))
            },
            "close" => self.core.close(invocation),
            _ => invocation.proceed(),
        }
    }
}

impl InstrumentedHandler for PooledConnectionHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

const CONNECTION_CALLS: InvocationFilter = InvocationFilter::Names(&[
    "is_wrapper_for",
    "unwrap_to",
    "close",
    "create_statement",
    "prepare_statement",
    "prepare_call",
]);

/// Wraps the statements a connection creates and ends the `.conn` lifetime
/// timer on close.
#[derive(Debug)]
pub struct ConnectionHandler {
    core: HandlerCore,
}

impl ConnectionHandler {
    pub(crate) fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl InvocationHandler for ConnectionHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &CONNECTION_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        let invocation = match self.core.common(invocation) {
            Ok(result) => return result,
            Err(invocation) => invocation,
        };
        let name = self.core.name();
        let instrumenter = &self.core.instrumenter;
        let method = invocation.method_name();
        match method {
            "create_statement" => {
                let statement = invocation.proceed()?;
                let statement = child(statement, method, DriverObject::as_statement, "Statement")?;
                trace!(name, "wrapping statement");
                let wrapped = instrumenter.wrap_statement(name, statement)?;
                Ok(Value::Object(DriverObject::Statement(wrapped)))
            },
            "prepare_statement" => {
                let sql = invocation.arg_str(0)?.to_owned();
                let statement = invocation.proceed()?;
                let statement = child(
                    statement,
                    method,
                    DriverObject::as_prepared_statement,
                    "PreparedStatement",
                )?;
                trace!(name, sql = sql.as_str(), "wrapping prepared statement");
                let wrapped = instrumenter.wrap_prepared_statement(name, statement, &sql)?;
                Ok(Value::Object(DriverObject::PreparedStatement(wrapped)))
            },
            "prepare_call" => {
                let sql = invocation.arg_str(0)?.to_owned();
                let statement = invocation.proceed()?;
                let statement = child(
                    statement,
                    method,
                    DriverObject::as_callable_statement,
                    "CallableStatement",
                )?;
                trace!(name, sql = sql.as_str(), "wrapping callable statement");
                let wrapped = instrumenter.wrap_callable_statement(name, statement, &sql)?;
                Ok(Value::Object(DriverObject::CallableStatement(wrapped)))
            },
            _ => invocation.proceed(),
        }
    }
}

impl InstrumentedHandler for ConnectionHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

const STATEMENT_CALLS: InvocationFilter = InvocationFilter::Names(&[
    "is_wrapper_for",
    "unwrap_to",
    "close",
    "execute",
    "execute_query",
    "execute_update",
]);

/// What kind of statement a [`StatementHandler`] wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Query text arrives with each execution.
    Plain,
    /// Query text was fixed when the statement was prepared.
    Prepared { sql: String, sql_id: String },
    /// Like `Prepared`, for stored-procedure calls.
    Callable { sql: String, sql_id: String },
}

impl StatementKind {
    /// Query text and identifier captured at preparation time.
    pub fn prepared_query(&self) -> Option<(&str, &str)> {
        match self {
            StatementKind::Plain => None,
            StatementKind::Prepared { sql, sql_id } | StatementKind::Callable { sql, sql_id } => {
                Some((sql, sql_id))
            },
        }
    }
}

/// Times executions under `<name>.<sql id>.exec` and wraps the result sets
/// they return.
#[derive(Debug)]
pub struct StatementHandler {
    core: HandlerCore,
    kind: StatementKind,
}

impl StatementHandler {
    pub(crate) fn new(core: HandlerCore, kind: StatementKind) -> Self {
        Self { core, kind }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    fn execute(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        let instrumenter = &self.core.instrumenter;
        let (sql, sql_id) = match invocation.arg(0).and_then(Value::as_str) {
            Some(sql) => (sql.to_owned(), instrumenter.build_sql_id(sql)),
            None => match self.kind.prepared_query() {
                Some((sql, sql_id)) => (sql.to_owned(), sql_id.to_owned()),
                None => return invocation.proceed(),
            },
        };

        let timer = instrumenter.start_execute_timer(self.core.name(), &sql, &sql_id);
        let result = invocation.proceed();
        timer.stop();

        match result? {
            Value::Object(object) if object.capability().is_result_set() => {
                let rows = object.as_result_set().ok_or(DriverError::TypeMismatch {
                    method: "execute_query",
                    expected: "ResultSet",
                })?;
                trace!(name = self.core.name(), sql_id = sql_id.as_str(), "wrapping result set");
                let wrapped =
                    instrumenter.wrap_result_set(self.core.name(), rows, &sql, &sql_id)?;
                Ok(Value::Object(DriverObject::ResultSet(wrapped)))
            },
            other => Ok(other),
        }
    }
}

impl InvocationHandler for StatementHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &STATEMENT_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        let invocation = match self.core.common(invocation) {
            Ok(result) => return result,
            Err(invocation) => invocation,
        };
        match invocation.method_name() {
            "execute" | "execute_query" | "execute_update" => self.execute(invocation),
            _ => invocation.proceed(),
        }
    }
}

impl InstrumentedHandler for StatementHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

// ---------------------------------------------------------------------------
// Result sets
// ---------------------------------------------------------------------------

const RESULT_SET_CALLS: InvocationFilter =
    InvocationFilter::Names(&["is_wrapper_for", "unwrap_to", "close"]);

/// Ends the `.rset` lifetime timer when the result set is closed.
#[derive(Debug)]
pub struct ResultSetHandler {
    core: HandlerCore,
}

impl ResultSetHandler {
    pub(crate) fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl InvocationHandler for ResultSetHandler {
    fn delegate(&self) -> &DriverObject {
        self.core.delegate()
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &RESULT_SET_CALLS
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        match self.core.common(invocation) {
            Ok(result) => result,
            Err(invocation) => invocation.proceed(),
        }
    }
}

impl InstrumentedHandler for ResultSetHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}
