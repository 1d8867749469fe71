//! The adapter: one forwarding type implementing every protocol contract.
//!
//! A [`Proxy`] implements all driver traits, but is only handed out through
//! the views its [`AdapterShape`] allows, so callers see exactly the
//! contracts of the capability set it was built for. Every call is described
//! by a static [`Method`] and either routed through the handler as an
//! [`Invocation`] or, when the shape does not intercept it, forwarded directly
//! to the delegate.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::driver::{
    CachedRowSet, CallValue, CallableStatement, Capability, CommonDataSource, Connection,
    DataSource, DriverObject, FilteredRowSet, JdbcRowSet, JoinRowSet, PooledConnection,
    PreparedStatement, ResultSet, RowSet, Statement, Value, WebRowSet, Wrapper, XaConnection,
    XaDataSource, XaResource,
};
use crate::error::{AdapterError, DriverError, DriverResult};
use crate::proxy::factory::AdapterShape;
use crate::proxy::handler::InvocationHandler;
use crate::proxy::invocation::{AdapterId, Invocation};
use crate::proxy::methods::{
    Method, cached_row_set, callable_statement, common_data_source, connection,
    data_source, filtered_row_set, jdbc_row_set, join_row_set, pooled_connection,
    prepared_statement, result_set, row_set, statement, web_row_set, wrapper, xa_connection,
    xa_data_source,
};

static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(1);

/// Forwarding adapter over an [`InvocationHandler`].
pub struct Proxy {
    id: AdapterId,
    handler: Arc<dyn InvocationHandler>,
    shape: Arc<AdapterShape>,
}

impl Proxy {
    pub(crate) fn new(handler: Arc<dyn InvocationHandler>, shape: Arc<AdapterShape>) -> Arc<Self> {
        Arc::new(Self {
            id: AdapterId(NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed)),
            handler,
            shape,
        })
    }

    #[inline]
    pub fn id(&self) -> AdapterId {
        self.id
    }

    #[inline]
    pub fn shape(&self) -> &AdapterShape {
        &self.shape
    }

    #[inline]
    pub fn handler(&self) -> &Arc<dyn InvocationHandler> {
        &self.handler
    }

    /// The adapter seen as `capability`, which must be one of the set's
    /// contracts or an ancestor of one.
    pub fn view(self: &Arc<Self>, capability: Capability) -> Result<DriverObject, AdapterError> {
        if !self.shape.views().contains(capability) {
            return Err(AdapterError::NotInSet(capability));
        }
        let this = Arc::clone(self);
        Ok(match capability {
            Capability::DataSource => DriverObject::DataSource(this),
            Capability::XaDataSource => DriverObject::XaDataSource(this),
            Capability::PooledConnection => DriverObject::PooledConnection(this),
            Capability::XaConnection => DriverObject::XaConnection(this),
            Capability::Connection => DriverObject::Connection(this),
            Capability::Statement => DriverObject::Statement(this),
            Capability::PreparedStatement => DriverObject::PreparedStatement(this),
            Capability::CallableStatement => DriverObject::CallableStatement(this),
            Capability::ResultSet => DriverObject::ResultSet(this),
            Capability::RowSet => DriverObject::RowSet(this),
            Capability::JdbcRowSet => DriverObject::JdbcRowSet(this),
            Capability::CachedRowSet => DriverObject::CachedRowSet(this),
            Capability::WebRowSet => DriverObject::WebRowSet(this),
            Capability::FilteredRowSet => DriverObject::FilteredRowSet(this),
            Capability::JoinRowSet => DriverObject::JoinRowSet(this),
        })
    }

    /// Routes one call: through the handler when the shape intercepts
    /// `method`, straight to the delegate otherwise.
    fn dispatch<T, A, F>(&self, method: &'static Method, args: A, forward: F) -> DriverResult<T>
    where
        T: CallValue,
        A: FnOnce() -> Vec<Value>,
        F: FnOnce() -> DriverResult<T> + Send,
    {
        if !self.shape.intercepts(method) {
            return forward();
        }
        let invocation = Invocation::new(
            self.handler.delegate(),
            self.id,
            method,
            args(),
            move || forward().map(CallValue::into_value),
        );
        T::from_value(self.handler.invoke(invocation)?, method.name)
    }

    fn target<T: ?Sized>(
        &self,
        view: fn(&DriverObject) -> Option<Arc<T>>,
        capability: Capability,
    ) -> DriverResult<Arc<T>> {
        view(self.handler.delegate()).ok_or_else(|| DriverError::Unsupported {
            capability,
            method: "delegate",
        })
    }

    fn common_data_source(&self) -> DriverResult<Arc<dyn CommonDataSource>> {
        self.target(DriverObject::as_common_data_source, Capability::DataSource)
    }

    fn data_source(&self) -> DriverResult<Arc<dyn DataSource>> {
        self.target(DriverObject::as_data_source, Capability::DataSource)
    }

    fn xa_data_source(&self) -> DriverResult<Arc<dyn XaDataSource>> {
        self.target(DriverObject::as_xa_data_source, Capability::XaDataSource)
    }

    fn pooled_connection(&self) -> DriverResult<Arc<dyn PooledConnection>> {
        self.target(DriverObject::as_pooled_connection, Capability::PooledConnection)
    }

    fn xa_connection(&self) -> DriverResult<Arc<dyn XaConnection>> {
        self.target(DriverObject::as_xa_connection, Capability::XaConnection)
    }

    fn connection(&self) -> DriverResult<Arc<dyn Connection>> {
        self.target(DriverObject::as_connection, Capability::Connection)
    }

    fn statement(&self) -> DriverResult<Arc<dyn Statement>> {
        self.target(DriverObject::as_statement, Capability::Statement)
    }

    fn prepared_statement(&self) -> DriverResult<Arc<dyn PreparedStatement>> {
        self.target(DriverObject::as_prepared_statement, Capability::PreparedStatement)
    }

    fn callable_statement(&self) -> DriverResult<Arc<dyn CallableStatement>> {
        self.target(DriverObject::as_callable_statement, Capability::CallableStatement)
    }

    fn result_set(&self) -> DriverResult<Arc<dyn ResultSet>> {
        self.target(DriverObject::as_result_set, Capability::ResultSet)
    }

    fn row_set(&self) -> DriverResult<Arc<dyn RowSet>> {
        self.target(DriverObject::as_row_set, Capability::RowSet)
    }

    fn jdbc_row_set(&self) -> DriverResult<Arc<dyn JdbcRowSet>> {
        self.target(DriverObject::as_jdbc_row_set, Capability::JdbcRowSet)
    }

    fn cached_row_set(&self) -> DriverResult<Arc<dyn CachedRowSet>> {
        self.target(DriverObject::as_cached_row_set, Capability::CachedRowSet)
    }

    fn web_row_set(&self) -> DriverResult<Arc<dyn WebRowSet>> {
        self.target(DriverObject::as_web_row_set, Capability::WebRowSet)
    }

    fn filtered_row_set(&self) -> DriverResult<Arc<dyn FilteredRowSet>> {
        self.target(DriverObject::as_filtered_row_set, Capability::FilteredRowSet)
    }

    fn join_row_set(&self) -> DriverResult<Arc<dyn JoinRowSet>> {
        self.target(DriverObject::as_join_row_set, Capability::JoinRowSet)
    }

    fn offers(&self, capability: Capability) -> bool {
        self.shape.views().contains(capability)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id)
            .field("capabilities", &self.shape.set().capabilities())
            .field("delegate", self.handler.delegate())
            .finish()
    }
}

fn no_args() -> Vec<Value> {
    Vec::new()
}

// ---------------------------------------------------------------------------
// Wrapper and connection factories
// ---------------------------------------------------------------------------

impl Wrapper for Proxy {
    fn is_wrapper_for(&self, capability: Capability) -> DriverResult<bool> {
        self.dispatch(
            &wrapper::IS_WRAPPER_FOR,
            || vec![capability.into()],
            || self.handler.delegate().is_wrapper_for(capability),
        )
    }

    fn unwrap_to(&self, capability: Capability) -> DriverResult<DriverObject> {
        self.dispatch(
            &wrapper::UNWRAP_TO,
            || vec![capability.into()],
            || self.handler.delegate().unwrap_to(capability),
        )
    }
}

impl CommonDataSource for Proxy {
    fn login_timeout(&self) -> DriverResult<i32> {
        self.dispatch(&common_data_source::LOGIN_TIMEOUT, no_args, || {
            self.common_data_source()?.login_timeout()
        })
    }

    fn set_login_timeout(&self, seconds: i32) -> DriverResult<()> {
        self.dispatch(
            &common_data_source::SET_LOGIN_TIMEOUT,
            || vec![seconds.into()],
            || self.common_data_source()?.set_login_timeout(seconds),
        )
    }
}

impl DataSource for Proxy {
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>> {
        self.dispatch(&data_source::GET_CONNECTION, no_args, || {
            self.data_source()?.get_connection()
        })
    }

    fn get_connection_with(&self, user: &str, password: &str) -> DriverResult<Arc<dyn Connection>> {
        self.dispatch(
            &data_source::GET_CONNECTION_WITH,
            || vec![user.into(), password.into()],
            || self.data_source()?.get_connection_with(user, password),
        )
    }
}

impl XaDataSource for Proxy {
    fn get_xa_connection(&self) -> DriverResult<Arc<dyn XaConnection>> {
        self.dispatch(&xa_data_source::GET_XA_CONNECTION, no_args, || {
            self.xa_data_source()?.get_xa_connection()
        })
    }

    fn get_xa_connection_with(
        &self,
        user: &str,
        password: &str,
    ) -> DriverResult<Arc<dyn XaConnection>> {
        self.dispatch(
            &xa_data_source::GET_XA_CONNECTION_WITH,
            || vec![user.into(), password.into()],
            || self.xa_data_source()?.get_xa_connection_with(user, password),
        )
    }
}

impl PooledConnection for Proxy {
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>> {
        self.dispatch(&pooled_connection::GET_CONNECTION, no_args, || {
            self.pooled_connection()?.get_connection()
        })
    }

    fn close(&self) -> DriverResult<()> {
        self.dispatch(&pooled_connection::CLOSE, no_args, || {
            self.pooled_connection()?.close()
        })
    }
}

impl XaConnection for Proxy {
    fn get_xa_resource(&self) -> DriverResult<Arc<dyn XaResource>> {
        self.dispatch(&xa_connection::GET_XA_RESOURCE, no_args, || {
            self.xa_connection()?.get_xa_resource()
        })
    }
}

// ---------------------------------------------------------------------------
// Connection and statements
// ---------------------------------------------------------------------------

impl Connection for Proxy {
    fn create_statement(&self) -> DriverResult<Arc<dyn Statement>> {
        self.dispatch(&connection::CREATE_STATEMENT, no_args, || {
            self.connection()?.create_statement()
        })
    }

    fn prepare_statement(&self, sql: &str) -> DriverResult<Arc<dyn PreparedStatement>> {
        self.dispatch(
            &connection::PREPARE_STATEMENT,
            || vec![sql.into()],
            || self.connection()?.prepare_statement(sql),
        )
    }

    fn prepare_call(&self, sql: &str) -> DriverResult<Arc<dyn CallableStatement>> {
        self.dispatch(
            &connection::PREPARE_CALL,
            || vec![sql.into()],
            || self.connection()?.prepare_call(sql),
        )
    }

    fn set_auto_commit(&self, auto_commit: bool) -> DriverResult<()> {
        self.dispatch(
            &connection::SET_AUTO_COMMIT,
            || vec![auto_commit.into()],
            || self.connection()?.set_auto_commit(auto_commit),
        )
    }

    fn auto_commit(&self) -> DriverResult<bool> {
        self.dispatch(&connection::AUTO_COMMIT, no_args, || {
            self.connection()?.auto_commit()
        })
    }

    fn commit(&self) -> DriverResult<()> {
        self.dispatch(&connection::COMMIT, no_args, || self.connection()?.commit())
    }

    fn rollback(&self) -> DriverResult<()> {
        self.dispatch(&connection::ROLLBACK, no_args, || {
            self.connection()?.rollback()
        })
    }

    fn close(&self) -> DriverResult<()> {
        self.dispatch(&connection::CLOSE, no_args, || self.connection()?.close())
    }

    fn is_closed(&self) -> DriverResult<bool> {
        self.dispatch(&connection::IS_CLOSED, no_args, || {
            self.connection()?.is_closed()
        })
    }
}

impl Statement for Proxy {
    fn execute(&self, sql: &str) -> DriverResult<bool> {
        self.dispatch(
            &statement::EXECUTE,
            || vec![sql.into()],
            || self.statement()?.execute(sql),
        )
    }

    fn execute_query(&self, sql: &str) -> DriverResult<Arc<dyn ResultSet>> {
        self.dispatch(
            &statement::EXECUTE_QUERY,
            || vec![sql.into()],
            || self.statement()?.execute_query(sql),
        )
    }

    fn execute_update(&self, sql: &str) -> DriverResult<i64> {
        self.dispatch(
            &statement::EXECUTE_UPDATE,
            || vec![sql.into()],
            || self.statement()?.execute_update(sql),
        )
    }

    fn add_batch(&self, sql: &str) -> DriverResult<()> {
        self.dispatch(
            &statement::ADD_BATCH,
            || vec![sql.into()],
            || self.statement()?.add_batch(sql),
        )
    }

    fn execute_batch(&self) -> DriverResult<Vec<i64>> {
        self.dispatch(&statement::EXECUTE_BATCH, no_args, || {
            self.statement()?.execute_batch()
        })
    }

    fn update_count(&self) -> DriverResult<i64> {
        self.dispatch(&statement::UPDATE_COUNT, no_args, || {
            self.statement()?.update_count()
        })
    }

    fn set_max_rows(&self, max_rows: i32) -> DriverResult<()> {
        self.dispatch(
            &statement::SET_MAX_ROWS,
            || vec![max_rows.into()],
            || self.statement()?.set_max_rows(max_rows),
        )
    }

    fn close(&self) -> DriverResult<()> {
        self.dispatch(&statement::CLOSE, no_args, || self.statement()?.close())
    }

    fn is_closed(&self) -> DriverResult<bool> {
        self.dispatch(&statement::IS_CLOSED, no_args, || {
            self.statement()?.is_closed()
        })
    }
}

impl PreparedStatement for Proxy {
    fn execute_prepared(&self) -> DriverResult<bool> {
        self.dispatch(&prepared_statement::EXECUTE, no_args, || {
            self.prepared_statement()?.execute_prepared()
        })
    }

    fn execute_query_prepared(&self) -> DriverResult<Arc<dyn ResultSet>> {
        self.dispatch(&prepared_statement::EXECUTE_QUERY, no_args, || {
            self.prepared_statement()?.execute_query_prepared()
        })
    }

    fn execute_update_prepared(&self) -> DriverResult<i64> {
        self.dispatch(&prepared_statement::EXECUTE_UPDATE, no_args, || {
            self.prepared_statement()?.execute_update_prepared()
        })
    }

    fn set_null(&self, index: i32) -> DriverResult<()> {
        self.dispatch(
            &prepared_statement::SET_NULL,
            || vec![index.into()],
            || self.prepared_statement()?.set_null(index),
        )
    }

    fn set_int(&self, index: i32, value: i32) -> DriverResult<()> {
        self.dispatch(
            &prepared_statement::SET_INT,
            || vec![index.into(), value.into()],
            || self.prepared_statement()?.set_int(index, value),
        )
    }

    fn set_long(&self, index: i32, value: i64) -> DriverResult<()> {
        self.dispatch(
            &prepared_statement::SET_LONG,
            || vec![index.into(), value.into()],
            || self.prepared_statement()?.set_long(index, value),
        )
    }

    fn set_string(&self, index: i32, value: &str) -> DriverResult<()> {
        self.dispatch(
            &prepared_statement::SET_STRING,
            || vec![index.into(), value.into()],
            || self.prepared_statement()?.set_string(index, value),
        )
    }

    fn clear_parameters(&self) -> DriverResult<()> {
        self.dispatch(&prepared_statement::CLEAR_PARAMETERS, no_args, || {
            self.prepared_statement()?.clear_parameters()
        })
    }
}

impl CallableStatement for Proxy {
    fn register_out_parameter(&self, index: i32, sql_type: i32) -> DriverResult<()> {
        self.dispatch(
            &callable_statement::REGISTER_OUT_PARAMETER,
            || vec![index.into(), sql_type.into()],
            || {
                self.callable_statement()?
                    .register_out_parameter(index, sql_type)
            },
        )
    }

    fn get_out_string(&self, index: i32) -> DriverResult<Option<String>> {
        self.dispatch(
            &callable_statement::GET_OUT_STRING,
            || vec![index.into()],
            || self.callable_statement()?.get_out_string(index),
        )
    }

    fn get_out_long(&self, index: i32) -> DriverResult<i64> {
        self.dispatch(
            &callable_statement::GET_OUT_LONG,
            || vec![index.into()],
            || self.callable_statement()?.get_out_long(index),
        )
    }

    fn out_was_null(&self) -> DriverResult<bool> {
        self.dispatch(&callable_statement::OUT_WAS_NULL, no_args, || {
            self.callable_statement()?.out_was_null()
        })
    }
}

// ---------------------------------------------------------------------------
// Result sets
// ---------------------------------------------------------------------------

impl ResultSet for Proxy {
    fn next(&self) -> DriverResult<bool> {
        self.dispatch(&result_set::NEXT, no_args, || self.result_set()?.next())
    }

    fn get_string(&self, column: i32) -> DriverResult<Option<String>> {
        self.dispatch(
            &result_set::GET_STRING,
            || vec![column.into()],
            || self.result_set()?.get_string(column),
        )
    }

    fn get_int(&self, column: i32) -> DriverResult<i32> {
        self.dispatch(
            &result_set::GET_INT,
            || vec![column.into()],
            || self.result_set()?.get_int(column),
        )
    }

    fn get_long(&self, column: i32) -> DriverResult<i64> {
        self.dispatch(
            &result_set::GET_LONG,
            || vec![column.into()],
            || self.result_set()?.get_long(column),
        )
    }

    fn get_double(&self, column: i32) -> DriverResult<f64> {
        self.dispatch(
            &result_set::GET_DOUBLE,
            || vec![column.into()],
            || self.result_set()?.get_double(column),
        )
    }

    fn find_column(&self, label: &str) -> DriverResult<i32> {
        self.dispatch(
            &result_set::FIND_COLUMN,
            || vec![label.into()],
            || self.result_set()?.find_column(label),
        )
    }

    fn was_null(&self) -> DriverResult<bool> {
        self.dispatch(&result_set::WAS_NULL, no_args, || {
            self.result_set()?.was_null()
        })
    }

    fn close(&self) -> DriverResult<()> {
        self.dispatch(&result_set::CLOSE, no_args, || self.result_set()?.close())
    }

    fn is_closed(&self) -> DriverResult<bool> {
        self.dispatch(&result_set::IS_CLOSED, no_args, || {
            self.result_set()?.is_closed()
        })
    }

    fn into_row_set(self: Arc<Self>) -> Option<Arc<dyn RowSet>> {
        if self.offers(Capability::RowSet) {
            Some(self)
        } else {
            None
        }
    }

    fn into_jdbc_row_set(self: Arc<Self>) -> Option<Arc<dyn JdbcRowSet>> {
        if self.offers(Capability::JdbcRowSet) {
            Some(self)
        } else {
            None
        }
    }

    fn into_cached_row_set(self: Arc<Self>) -> Option<Arc<dyn CachedRowSet>> {
        if self.offers(Capability::CachedRowSet) {
            Some(self)
        } else {
            None
        }
    }

    fn into_web_row_set(self: Arc<Self>) -> Option<Arc<dyn WebRowSet>> {
        if self.offers(Capability::WebRowSet) {
            Some(self)
        } else {
            None
        }
    }

    fn into_filtered_row_set(self: Arc<Self>) -> Option<Arc<dyn FilteredRowSet>> {
        if self.offers(Capability::FilteredRowSet) {
            Some(self)
        } else {
            None
        }
    }

    fn into_join_row_set(self: Arc<Self>) -> Option<Arc<dyn JoinRowSet>> {
        if self.offers(Capability::JoinRowSet) {
            Some(self)
        } else {
            None
        }
    }
}

impl RowSet for Proxy {
    fn command(&self) -> DriverResult<Option<String>> {
        self.dispatch(&row_set::COMMAND, no_args, || self.row_set()?.command())
    }

    fn set_command(&self, command: &str) -> DriverResult<()> {
        self.dispatch(
            &row_set::SET_COMMAND,
            || vec![command.into()],
            || self.row_set()?.set_command(command),
        )
    }

    fn execute_row_set(&self) -> DriverResult<()> {
        self.dispatch(&row_set::EXECUTE, no_args, || {
            self.row_set()?.execute_row_set()
        })
    }
}

impl JdbcRowSet for Proxy {
    fn commit(&self) -> DriverResult<()> {
        self.dispatch(&jdbc_row_set::COMMIT, no_args, || {
            self.jdbc_row_set()?.commit()
        })
    }

    fn rollback(&self) -> DriverResult<()> {
        self.dispatch(&jdbc_row_set::ROLLBACK, no_args, || {
            self.jdbc_row_set()?.rollback()
        })
    }

    fn set_auto_commit(&self, auto_commit: bool) -> DriverResult<()> {
        self.dispatch(
            &jdbc_row_set::SET_AUTO_COMMIT,
            || vec![auto_commit.into()],
            || self.jdbc_row_set()?.set_auto_commit(auto_commit),
        )
    }

    fn auto_commit(&self) -> DriverResult<bool> {
        self.dispatch(&jdbc_row_set::AUTO_COMMIT, no_args, || {
            self.jdbc_row_set()?.auto_commit()
        })
    }
}

impl CachedRowSet for Proxy {
    fn size(&self) -> DriverResult<usize> {
        self.dispatch(&cached_row_set::SIZE, no_args, || {
            self.cached_row_set()?.size()
        })
    }

    fn accept_changes(&self) -> DriverResult<()> {
        self.dispatch(&cached_row_set::ACCEPT_CHANGES, no_args, || {
            self.cached_row_set()?.accept_changes()
        })
    }

    fn release(&self) -> DriverResult<()> {
        self.dispatch(&cached_row_set::RELEASE, no_args, || {
            self.cached_row_set()?.release()
        })
    }
}

impl WebRowSet for Proxy {
    fn write_xml(&self) -> DriverResult<String> {
        self.dispatch(&web_row_set::WRITE_XML, no_args, || {
            self.web_row_set()?.write_xml()
        })
    }
}

impl FilteredRowSet for Proxy {
    fn set_filter(&self, predicate: &str) -> DriverResult<()> {
        self.dispatch(
            &filtered_row_set::SET_FILTER,
            || vec![predicate.into()],
            || self.filtered_row_set()?.set_filter(predicate),
        )
    }

    fn filter(&self) -> DriverResult<Option<String>> {
        self.dispatch(&filtered_row_set::FILTER, no_args, || {
            self.filtered_row_set()?.filter()
        })
    }
}

impl JoinRowSet for Proxy {
    fn join_type(&self) -> DriverResult<i32> {
        self.dispatch(&join_row_set::JOIN_TYPE, no_args, || {
            self.join_row_set()?.join_type()
        })
    }

    fn set_join_type(&self, join_type: i32) -> DriverResult<()> {
        self.dispatch(
            &join_row_set::SET_JOIN_TYPE,
            || vec![join_type.into()],
            || self.join_row_set()?.set_join_type(join_type),
        )
    }

    fn where_clause(&self) -> DriverResult<String> {
        self.dispatch(&join_row_set::WHERE_CLAUSE, no_args, || {
            self.join_row_set()?.where_clause()
        })
    }
}
