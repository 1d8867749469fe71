//! The wrapped protocol surface: contracts, type-erased handles and call
//! values.
//!
//! ## Key Components
//!
//! - [`Capability`] / [`CapabilityMask`]: the closed set of contracts.
//! - [`traits`]: one trait per contract, all extending [`Wrapper`].
//! - [`DriverObject`]: an `Arc<dyn Contract>` tagged with its contract.
//! - [`Value`]: dynamically typed call arguments and results.

pub mod capability;
pub mod object;
pub mod traits;
pub mod value;

pub use capability::{Capability, CapabilityMask};
pub use object::DriverObject;
pub use traits::{
    CachedRowSet, CallableStatement, CommonDataSource, Connection, DataSource, FilteredRowSet,
    JdbcRowSet, JoinRowSet, PooledConnection, PreparedStatement, ResultSet, RowSet, Statement,
    WebRowSet, Wrapper, XaConnection, XaDataSource, XaResource,
};
pub use value::{CallValue, Value};
