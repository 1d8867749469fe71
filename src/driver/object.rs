//! Type-erased handle on any driver object.

use std::fmt;
use std::sync::Arc;

use crate::driver::capability::Capability;
use crate::driver::traits::{
    CachedRowSet, CallableStatement, CommonDataSource, Connection, DataSource, FilteredRowSet,
    JdbcRowSet, JoinRowSet, PooledConnection, PreparedStatement, ResultSet, RowSet, Statement,
    WebRowSet, Wrapper, XaConnection, XaDataSource,
};
use crate::error::DriverResult;

/// A driver object together with the most specific contract it is known by.
///
/// The variant records the static type the object was handed out as. Wider
/// views are available through the `as_*` accessors (trait upcasting);
/// narrower result-set views go through the [`ResultSet`] `into_*` probes.
#[derive(Clone)]
pub enum DriverObject {
    DataSource(Arc<dyn DataSource>),
    XaDataSource(Arc<dyn XaDataSource>),
    PooledConnection(Arc<dyn PooledConnection>),
    XaConnection(Arc<dyn XaConnection>),
    Connection(Arc<dyn Connection>),
    Statement(Arc<dyn Statement>),
    PreparedStatement(Arc<dyn PreparedStatement>),
    CallableStatement(Arc<dyn CallableStatement>),
    ResultSet(Arc<dyn ResultSet>),
    RowSet(Arc<dyn RowSet>),
    JdbcRowSet(Arc<dyn JdbcRowSet>),
    CachedRowSet(Arc<dyn CachedRowSet>),
    WebRowSet(Arc<dyn WebRowSet>),
    FilteredRowSet(Arc<dyn FilteredRowSet>),
    JoinRowSet(Arc<dyn JoinRowSet>),
}

impl DriverObject {
    /// The contract this handle was created with.
    pub fn capability(&self) -> Capability {
        match self {
            DriverObject::DataSource(_) => Capability::DataSource,
            DriverObject::XaDataSource(_) => Capability::XaDataSource,
            DriverObject::PooledConnection(_) => Capability::PooledConnection,
            DriverObject::XaConnection(_) => Capability::XaConnection,
            DriverObject::Connection(_) => Capability::Connection,
            DriverObject::Statement(_) => Capability::Statement,
            DriverObject::PreparedStatement(_) => Capability::PreparedStatement,
            DriverObject::CallableStatement(_) => Capability::CallableStatement,
            DriverObject::ResultSet(_) => Capability::ResultSet,
            DriverObject::RowSet(_) => Capability::RowSet,
            DriverObject::JdbcRowSet(_) => Capability::JdbcRowSet,
            DriverObject::CachedRowSet(_) => Capability::CachedRowSet,
            DriverObject::WebRowSet(_) => Capability::WebRowSet,
            DriverObject::FilteredRowSet(_) => Capability::FilteredRowSet,
            DriverObject::JoinRowSet(_) => Capability::JoinRowSet,
        }
    }

    /// The object seen through its [`Wrapper`] contract.
    pub fn wrapper(&self) -> &dyn Wrapper {
        match self {
            DriverObject::DataSource(o) => &**o,
            DriverObject::XaDataSource(o) => &**o,
            DriverObject::PooledConnection(o) => &**o,
            DriverObject::XaConnection(o) => &**o,
            DriverObject::Connection(o) => &**o,
            DriverObject::Statement(o) => &**o,
            DriverObject::PreparedStatement(o) => &**o,
            DriverObject::CallableStatement(o) => &**o,
            DriverObject::ResultSet(o) => &**o,
            DriverObject::RowSet(o) => &**o,
            DriverObject::JdbcRowSet(o) => &**o,
            DriverObject::CachedRowSet(o) => &**o,
            DriverObject::WebRowSet(o) => &**o,
            DriverObject::FilteredRowSet(o) => &**o,
            DriverObject::JoinRowSet(o) => &**o,
        }
    }

    /// Address of the underlying object, ignoring the view.
    pub fn addr(&self) -> *const () {
        match self {
            DriverObject::DataSource(o) => Arc::as_ptr(o) as *const (),
            DriverObject::XaDataSource(o) => Arc::as_ptr(o) as *const (),
            DriverObject::PooledConnection(o) => Arc::as_ptr(o) as *const (),
            DriverObject::XaConnection(o) => Arc::as_ptr(o) as *const (),
            DriverObject::Connection(o) => Arc::as_ptr(o) as *const (),
            DriverObject::Statement(o) => Arc::as_ptr(o) as *const (),
            DriverObject::PreparedStatement(o) => Arc::as_ptr(o) as *const (),
            DriverObject::CallableStatement(o) => Arc::as_ptr(o) as *const (),
            DriverObject::ResultSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::RowSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::JdbcRowSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::CachedRowSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::WebRowSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::FilteredRowSet(o) => Arc::as_ptr(o) as *const (),
            DriverObject::JoinRowSet(o) => Arc::as_ptr(o) as *const (),
        }
    }

    /// Whether both handles point at the same object.
    #[inline]
    pub fn same_object(&self, other: &DriverObject) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }

    /// Whether the object can be viewed as `capability`.
    pub fn satisfies(&self, capability: Capability) -> bool {
        self.narrow(capability).is_some()
    }

    /// Re-types the handle as `capability`, if the object satisfies it.
    pub fn narrow(&self, capability: Capability) -> Option<DriverObject> {
        Some(match capability {
            Capability::DataSource => DriverObject::DataSource(self.as_data_source()?),
            Capability::XaDataSource => DriverObject::XaDataSource(self.as_xa_data_source()?),
            Capability::PooledConnection => {
                DriverObject::PooledConnection(self.as_pooled_connection()?)
            }
            Capability::XaConnection => DriverObject::XaConnection(self.as_xa_connection()?),
            Capability::Connection => DriverObject::Connection(self.as_connection()?),
            Capability::Statement => DriverObject::Statement(self.as_statement()?),
            Capability::PreparedStatement => {
                DriverObject::PreparedStatement(self.as_prepared_statement()?)
            }
            Capability::CallableStatement => {
                DriverObject::CallableStatement(self.as_callable_statement()?)
            }
            Capability::ResultSet => DriverObject::ResultSet(self.as_result_set()?),
            Capability::RowSet => DriverObject::RowSet(self.as_row_set()?),
            Capability::JdbcRowSet => DriverObject::JdbcRowSet(self.as_jdbc_row_set()?),
            Capability::CachedRowSet => DriverObject::CachedRowSet(self.as_cached_row_set()?),
            Capability::WebRowSet => DriverObject::WebRowSet(self.as_web_row_set()?),
            Capability::FilteredRowSet => {
                DriverObject::FilteredRowSet(self.as_filtered_row_set()?)
            }
            Capability::JoinRowSet => DriverObject::JoinRowSet(self.as_join_row_set()?),
        })
    }

    /// Forwards to the object's own [`Wrapper::is_wrapper_for`].
    pub fn is_wrapper_for(&self, capability: Capability) -> DriverResult<bool> {
        self.wrapper().is_wrapper_for(capability)
    }

    /// Forwards to the object's own [`Wrapper::unwrap_to`].
    pub fn unwrap_to(&self, capability: Capability) -> DriverResult<DriverObject> {
        self.wrapper().unwrap_to(capability)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn as_data_source(&self) -> Option<Arc<dyn DataSource>> {
        match self {
            DriverObject::DataSource(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_xa_data_source(&self) -> Option<Arc<dyn XaDataSource>> {
        match self {
            DriverObject::XaDataSource(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_common_data_source(&self) -> Option<Arc<dyn CommonDataSource>> {
        match self {
            DriverObject::DataSource(o) => Some(o.clone() as Arc<dyn CommonDataSource>),
            DriverObject::XaDataSource(o) => Some(o.clone() as Arc<dyn CommonDataSource>),
            _ => None,
        }
    }

    pub fn as_pooled_connection(&self) -> Option<Arc<dyn PooledConnection>> {
        match self {
            DriverObject::PooledConnection(o) => Some(o.clone()),
            DriverObject::XaConnection(o) => Some(o.clone() as Arc<dyn PooledConnection>),
            _ => None,
        }
    }

    pub fn as_xa_connection(&self) -> Option<Arc<dyn XaConnection>> {
        match self {
            DriverObject::XaConnection(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<Arc<dyn Connection>> {
        match self {
            DriverObject::Connection(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<Arc<dyn Statement>> {
        match self {
            DriverObject::Statement(o) => Some(o.clone()),
            DriverObject::PreparedStatement(o) => Some(o.clone() as Arc<dyn Statement>),
            DriverObject::CallableStatement(o) => Some(o.clone() as Arc<dyn Statement>),
            _ => None,
        }
    }

    pub fn as_prepared_statement(&self) -> Option<Arc<dyn PreparedStatement>> {
        match self {
            DriverObject::PreparedStatement(o) => Some(o.clone()),
            DriverObject::CallableStatement(o) => Some(o.clone() as Arc<dyn PreparedStatement>),
            _ => None,
        }
    }

    pub fn as_callable_statement(&self) -> Option<Arc<dyn CallableStatement>> {
        match self {
            DriverObject::CallableStatement(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_result_set(&self) -> Option<Arc<dyn ResultSet>> {
        match self {
            DriverObject::ResultSet(o) => Some(o.clone()),
            DriverObject::RowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            DriverObject::JdbcRowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            DriverObject::CachedRowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            DriverObject::WebRowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            DriverObject::FilteredRowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            DriverObject::JoinRowSet(o) => Some(o.clone() as Arc<dyn ResultSet>),
            _ => None,
        }
    }

    pub fn as_row_set(&self) -> Option<Arc<dyn RowSet>> {
        match self {
            DriverObject::RowSet(o) => Some(o.clone()),
            DriverObject::JdbcRowSet(o) => Some(o.clone() as Arc<dyn RowSet>),
            DriverObject::CachedRowSet(o) => Some(o.clone() as Arc<dyn RowSet>),
            DriverObject::WebRowSet(o) => Some(o.clone() as Arc<dyn RowSet>),
            DriverObject::FilteredRowSet(o) => Some(o.clone() as Arc<dyn RowSet>),
            DriverObject::JoinRowSet(o) => Some(o.clone() as Arc<dyn RowSet>),
            _ => self.as_result_set()?.into_row_set(),
        }
    }

    pub fn as_jdbc_row_set(&self) -> Option<Arc<dyn JdbcRowSet>> {
        match self {
            DriverObject::JdbcRowSet(o) => Some(o.clone()),
            _ => self.as_result_set()?.into_jdbc_row_set(),
        }
    }

    pub fn as_cached_row_set(&self) -> Option<Arc<dyn CachedRowSet>> {
        match self {
            DriverObject::CachedRowSet(o) => Some(o.clone()),
            DriverObject::WebRowSet(o) => Some(o.clone() as Arc<dyn CachedRowSet>),
            DriverObject::FilteredRowSet(o) => Some(o.clone() as Arc<dyn CachedRowSet>),
            DriverObject::JoinRowSet(o) => Some(o.clone() as Arc<dyn CachedRowSet>),
            _ => self.as_result_set()?.into_cached_row_set(),
        }
    }

    pub fn as_web_row_set(&self) -> Option<Arc<dyn WebRowSet>> {
        match self {
            DriverObject::WebRowSet(o) => Some(o.clone()),
            DriverObject::FilteredRowSet(o) => Some(o.clone() as Arc<dyn WebRowSet>),
            DriverObject::JoinRowSet(o) => Some(o.clone() as Arc<dyn WebRowSet>),
            _ => self.as_result_set()?.into_web_row_set(),
        }
    }

    pub fn as_filtered_row_set(&self) -> Option<Arc<dyn FilteredRowSet>> {
        match self {
            DriverObject::FilteredRowSet(o) => Some(o.clone()),
            _ => self.as_result_set()?.into_filtered_row_set(),
        }
    }

    pub fn as_join_row_set(&self) -> Option<Arc<dyn JoinRowSet>> {
        match self {
            DriverObject::JoinRowSet(o) => Some(o.clone()),
            _ => self.as_result_set()?.into_join_row_set(),
        }
    }
}

impl fmt::Debug for DriverObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DriverObject::{}({:p})", self.capability(), self.addr())
    }
}

macro_rules! driver_object_from {
    ($($variant:ident => $contract:ident),* $(,)?) => {
        $(
            impl From<Arc<dyn $contract>> for DriverObject {
                fn from(object: Arc<dyn $contract>) -> Self {
                    DriverObject::$variant(object)
                }
            }
        )*
    };
}

driver_object_from! {
    DataSource => DataSource,
    XaDataSource => XaDataSource,
    PooledConnection => PooledConnection,
    XaConnection => XaConnection,
    Connection => Connection,
    Statement => Statement,
    PreparedStatement => PreparedStatement,
    CallableStatement => CallableStatement,
    ResultSet => ResultSet,
    RowSet => RowSet,
    JdbcRowSet => JdbcRowSet,
    CachedRowSet => CachedRowSet,
    WebRowSet => WebRowSet,
    FilteredRowSet => FilteredRowSet,
    JoinRowSet => JoinRowSet,
}
