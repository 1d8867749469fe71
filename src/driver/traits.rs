//! Protocol contracts of the driver object graph.
//!
//! ```text
//!   DataSource ─┐                      ┌─ Statement ◀─ PreparedStatement ◀─ CallableStatement
//!               ├─▶ Connection ──────▶─┤
//!   XaDataSource ─▶ XaConnection ──┘   └─▶ ResultSet ◀─ RowSet ◀─┬─ JdbcRowSet
//!                   (PooledConnection)                           └─ CachedRowSet ◀─ WebRowSet ◀─┬─ FilteredRowSet
//!                                                                                               └─ JoinRowSet
//! ```
//!
//! Every contract extends [`Wrapper`], so any object can be asked whether it
//! wraps another implementation of a contract and to hand that out.
//!
//! Methods with a default body are optional features of a driver: the default
//! reports [`DriverError::Unsupported`].
//!
//! Result-set objects can be narrowed to a more specific row-set contract
//! through the `into_*` probes of [`ResultSet`]; an implementation satisfying
//! e.g. [`JoinRowSet`] overrides `into_join_row_set` and the probes of every
//! contract in between.

use std::sync::Arc;

use crate::driver::capability::Capability;
use crate::driver::object::DriverObject;
use crate::error::{DriverError, DriverResult};

fn unsupported<T>(capability: Capability, method: &'static str) -> DriverResult<T> {
    Err(DriverError::Unsupported { capability, method })
}

/// Access to the object a driver object wraps, if any.
pub trait Wrapper: Send + Sync {
    /// Whether this object implements `capability` by wrapping another object.
    fn is_wrapper_for(&self, capability: Capability) -> DriverResult<bool> {
        let _ = capability;
        Ok(false)
    }

    /// Returns the wrapped object viewed as `capability`.
    fn unwrap_to(&self, capability: Capability) -> DriverResult<DriverObject> {
        Err(DriverError::not_a_wrapper(capability))
    }
}

// ---------------------------------------------------------------------------
// Connection factories
// ---------------------------------------------------------------------------

/// Settings shared by both data source kinds.
pub trait CommonDataSource: Wrapper {
    /// Login timeout in seconds, 0 meaning the driver default.
    fn login_timeout(&self) -> DriverResult<i32> {
        Ok(0)
    }

    fn set_login_timeout(&self, seconds: i32) -> DriverResult<()> {
        let _ = seconds;
        unsupported(Capability::DataSource, "set_login_timeout")
    }
}

pub trait DataSource: CommonDataSource {
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>>;

    fn get_connection_with(&self, user: &str, password: &str) -> DriverResult<Arc<dyn Connection>> {
        let _ = (user, password);
        unsupported(Capability::DataSource, "get_connection")
    }
}

pub trait XaDataSource: CommonDataSource {
    fn get_xa_connection(&self) -> DriverResult<Arc<dyn XaConnection>>;

    fn get_xa_connection_with(
        &self,
        user: &str,
        password: &str,
    ) -> DriverResult<Arc<dyn XaConnection>> {
        let _ = (user, password);
        unsupported(Capability::XaDataSource, "get_xa_connection")
    }
}

/// Physical connection handed out by a pool.
pub trait PooledConnection: Wrapper {
    /// Returns a logical connection over the physical one.
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>>;

    /// Closes the physical connection.
    fn close(&self) -> DriverResult<()>;
}

/// Pooled connection that takes part in distributed transactions.
pub trait XaConnection: PooledConnection {
    fn get_xa_resource(&self) -> DriverResult<Arc<dyn XaResource>>;
}

/// Transaction branch control. Not instrumented; handed out as is.
pub trait XaResource: Send + Sync {
    fn prepare(&self, xid: &str) -> DriverResult<i32>;
    fn commit(&self, xid: &str, one_phase: bool) -> DriverResult<()>;
    fn rollback(&self, xid: &str) -> DriverResult<()>;
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

pub trait Connection: Wrapper {
    fn create_statement(&self) -> DriverResult<Arc<dyn Statement>>;
    fn prepare_statement(&self, sql: &str) -> DriverResult<Arc<dyn PreparedStatement>>;
    fn prepare_call(&self, sql: &str) -> DriverResult<Arc<dyn CallableStatement>>;

    fn set_auto_commit(&self, auto_commit: bool) -> DriverResult<()> {
        let _ = auto_commit;
        unsupported(Capability::Connection, "set_auto_commit")
    }

    fn auto_commit(&self) -> DriverResult<bool> {
        Ok(true)
    }

    fn commit(&self) -> DriverResult<()> {
        unsupported(Capability::Connection, "commit")
    }

    fn rollback(&self) -> DriverResult<()> {
        unsupported(Capability::Connection, "rollback")
    }

    fn close(&self) -> DriverResult<()>;
    fn is_closed(&self) -> DriverResult<bool>;
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

pub trait Statement: Wrapper {
    /// Executes `sql`; `true` when the first result is a result set.
    fn execute(&self, sql: &str) -> DriverResult<bool>;
    fn execute_query(&self, sql: &str) -> DriverResult<Arc<dyn ResultSet>>;
    fn execute_update(&self, sql: &str) -> DriverResult<i64>;

    fn add_batch(&self, sql: &str) -> DriverResult<()> {
        let _ = sql;
        unsupported(Capability::Statement, "add_batch")
    }

    fn execute_batch(&self) -> DriverResult<Vec<i64>> {
        unsupported(Capability::Statement, "execute_batch")
    }

    /// Update count of the last execution, -1 when it produced a result set.
    fn update_count(&self) -> DriverResult<i64> {
        Ok(-1)
    }

    fn set_max_rows(&self, max_rows: i32) -> DriverResult<()> {
        let _ = max_rows;
        unsupported(Capability::Statement, "set_max_rows")
    }

    fn close(&self) -> DriverResult<()>;
    fn is_closed(&self) -> DriverResult<bool>;
}

/// Statement compiled once from the text given to
/// [`Connection::prepare_statement`], executed with bound parameters.
pub trait PreparedStatement: Statement {
    fn execute_prepared(&self) -> DriverResult<bool>;
    fn execute_query_prepared(&self) -> DriverResult<Arc<dyn ResultSet>>;
    fn execute_update_prepared(&self) -> DriverResult<i64>;

    fn set_null(&self, index: i32) -> DriverResult<()> {
        let _ = index;
        unsupported(Capability::PreparedStatement, "set_null")
    }

    fn set_int(&self, index: i32, value: i32) -> DriverResult<()> {
        self.set_long(index, i64::from(value))
    }

    fn set_long(&self, index: i32, value: i64) -> DriverResult<()> {
        let _ = (index, value);
        unsupported(Capability::PreparedStatement, "set_long")
    }

    fn set_string(&self, index: i32, value: &str) -> DriverResult<()> {
        let _ = (index, value);
        unsupported(Capability::PreparedStatement, "set_string")
    }

    fn clear_parameters(&self) -> DriverResult<()> {
        Ok(())
    }
}

/// Stored procedure call with output parameters.
pub trait CallableStatement: PreparedStatement {
    fn register_out_parameter(&self, index: i32, sql_type: i32) -> DriverResult<()> {
        let _ = (index, sql_type);
        unsupported(Capability::CallableStatement, "register_out_parameter")
    }

    fn get_out_string(&self, index: i32) -> DriverResult<Option<String>> {
        let _ = index;
        unsupported(Capability::CallableStatement, "get_out_string")
    }

    fn get_out_long(&self, index: i32) -> DriverResult<i64> {
        let _ = index;
        unsupported(Capability::CallableStatement, "get_out_long")
    }

    fn out_was_null(&self) -> DriverResult<bool> {
        Ok(false)
    }
}

// ---------------------------------------------------------------------------
// Result sets
// ---------------------------------------------------------------------------

/// Cursor over rows. Columns are 1-based.
pub trait ResultSet: Wrapper {
    fn next(&self) -> DriverResult<bool>;
    fn get_string(&self, column: i32) -> DriverResult<Option<String>>;

    fn get_int(&self, column: i32) -> DriverResult<i32> {
        let _ = column;
        unsupported(Capability::ResultSet, "get_int")
    }

    fn get_long(&self, column: i32) -> DriverResult<i64> {
        let _ = column;
        unsupported(Capability::ResultSet, "get_long")
    }

    fn get_double(&self, column: i32) -> DriverResult<f64> {
        let _ = column;
        unsupported(Capability::ResultSet, "get_double")
    }

    /// Maps a column label to its 1-based index.
    fn find_column(&self, label: &str) -> DriverResult<i32> {
        let _ = label;
        unsupported(Capability::ResultSet, "find_column")
    }

    fn was_null(&self) -> DriverResult<bool> {
        Ok(false)
    }

    fn close(&self) -> DriverResult<()>;
    fn is_closed(&self) -> DriverResult<bool>;

    fn into_row_set(self: Arc<Self>) -> Option<Arc<dyn RowSet>> {
        None
    }

    fn into_jdbc_row_set(self: Arc<Self>) -> Option<Arc<dyn JdbcRowSet>> {
        None
    }

    fn into_cached_row_set(self: Arc<Self>) -> Option<Arc<dyn CachedRowSet>> {
        None
    }

    fn into_web_row_set(self: Arc<Self>) -> Option<Arc<dyn WebRowSet>> {
        None
    }

    fn into_filtered_row_set(self: Arc<Self>) -> Option<Arc<dyn FilteredRowSet>> {
        None
    }

    fn into_join_row_set(self: Arc<Self>) -> Option<Arc<dyn JoinRowSet>> {
        None
    }
}

/// Result set that can populate itself from a command.
pub trait RowSet: ResultSet {
    fn command(&self) -> DriverResult<Option<String>>;
    fn set_command(&self, command: &str) -> DriverResult<()>;

    /// Runs the command and fills the row set.
    fn execute_row_set(&self) -> DriverResult<()>;
}

/// Row set that keeps its connection open.
pub trait JdbcRowSet: RowSet {
    fn commit(&self) -> DriverResult<()>;
    fn rollback(&self) -> DriverResult<()>;

    fn set_auto_commit(&self, auto_commit: bool) -> DriverResult<()> {
        let _ = auto_commit;
        unsupported(Capability::JdbcRowSet, "set_auto_commit")
    }

    fn auto_commit(&self) -> DriverResult<bool> {
        Ok(true)
    }
}

/// Disconnected row set holding its rows in memory.
pub trait CachedRowSet: RowSet {
    fn size(&self) -> DriverResult<usize>;

    fn accept_changes(&self) -> DriverResult<()> {
        unsupported(Capability::CachedRowSet, "accept_changes")
    }

    fn release(&self) -> DriverResult<()> {
        Ok(())
    }
}

/// Cached row set that can serialize itself as XML.
pub trait WebRowSet: CachedRowSet {
    fn write_xml(&self) -> DriverResult<String>;
}

/// Web row set exposing only rows accepted by a filter.
pub trait FilteredRowSet: WebRowSet {
    fn set_filter(&self, predicate: &str) -> DriverResult<()>;
    fn filter(&self) -> DriverResult<Option<String>>;
}

/// Web row set combining several row sets with a SQL join.
pub trait JoinRowSet: WebRowSet {
    fn join_type(&self) -> DriverResult<i32>;

    fn set_join_type(&self, join_type: i32) -> DriverResult<()> {
        let _ = join_type;
        unsupported(Capability::JoinRowSet, "set_join_type")
    }

    fn where_clause(&self) -> DriverResult<String>;
}
