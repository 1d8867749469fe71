//! Static call descriptors, one per protocol method.
//!
//! A descriptor names the call the way the protocol does, so overloads share
//! a name and differ by parameter shape: `Statement::execute(sql)` and
//! `PreparedStatement::execute_prepared()` are both `execute`, with one and
//! zero parameters. The `slot` indexes routing tables.

use std::fmt;

use crate::driver::Capability;

/// Declared parameter type of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Capability,
    Bool,
    Int,
    Long,
    Text,
}

/// Descriptor of one protocol call.
#[derive(Clone, Copy)]
pub struct Method {
    /// Declaring contract; `None` for the shared `Wrapper` and
    /// `CommonDataSource` calls.
    pub owner: Option<Capability>,
    pub name: &'static str,
    pub params: &'static [ParamKind],
    pub slot: u8,
}

impl Method {
    const fn new(
        owner: Option<Capability>,
        name: &'static str,
        params: &'static [ParamKind],
        slot: u8,
    ) -> Self {
        Self {
            owner,
            name,
            params,
            slot,
        }
    }

    /// Whether the call has exactly this name and parameter shape.
    pub fn matches(&self, name: &str, params: &[ParamKind]) -> bool {
        self.name == name && self.params == params
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl Eq for Method {}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}::{}{:?}", owner, self.name, self.params),
            None => write!(f, "{}{:?}", self.name, self.params),
        }
    }
}

use Capability as C;
use ParamKind as P;

pub mod wrapper {
    use super::*;

    pub static IS_WRAPPER_FOR: Method = Method::new(None, "is_wrapper_for", &[P::Capability], 0);
    pub static UNWRAP_TO: Method = Method::new(None, "unwrap_to", &[P::Capability], 1);
}

pub mod common_data_source {
    use super::*;

    pub static LOGIN_TIMEOUT: Method = Method::new(None, "login_timeout", &[], 2);
    pub static SET_LOGIN_TIMEOUT: Method = Method::new(None, "set_login_timeout", &[P::Int], 3);
}

pub mod data_source {
    use super::*;

    pub static GET_CONNECTION: Method = Method::new(Some(C::DataSource), "get_connection", &[], 4);
    pub static GET_CONNECTION_WITH: Method =
        Method::new(Some(C::DataSource), "get_connection", &[P::Text, P::Text], 5);
}

pub mod xa_data_source {
    use super::*;

    pub static GET_XA_CONNECTION: Method =
        Method::new(Some(C::XaDataSource), "get_xa_connection", &[], 6);
    pub static GET_XA_CONNECTION_WITH: Method = Method::new(
        Some(C::XaDataSource),
        "get_xa_connection",
        &[P::Text, P::Text],
        7,
    );
}

pub mod pooled_connection {
    use super::*;

    pub static GET_CONNECTION: Method =
        Method::new(Some(C::PooledConnection), "get_connection", &[], 8);
    pub static CLOSE: Method = Method::new(Some(C::PooledConnection), "close", &[], 9);
}

pub mod xa_connection {
    use super::*;

    pub static GET_XA_RESOURCE: Method =
        Method::new(Some(C::XaConnection), "get_xa_resource", &[], 10);
}

pub mod connection {
    use super::*;

    pub static CREATE_STATEMENT: Method =
        Method::new(Some(C::Connection), "create_statement", &[], 11);
    pub static PREPARE_STATEMENT: Method =
        Method::new(Some(C::Connection), "prepare_statement", &[P::Text], 12);
    pub static PREPARE_CALL: Method = Method::new(Some(C::Connection), "prepare_call", &[P::Text], 13);
    pub static SET_AUTO_COMMIT: Method =
        Method::new(Some(C::Connection), "set_auto_commit", &[P::Bool], 14);
    pub static AUTO_COMMIT: Method = Method::new(Some(C::Connection), "auto_commit", &[], 15);
    pub static COMMIT: Method = Method::new(Some(C::Connection), "commit", &[], 16);
    pub static ROLLBACK: Method = Method::new(Some(C::Connection), "rollback", &[], 17);
    pub static CLOSE: Method = Method::new(Some(C::Connection), "close", &[], 18);
    pub static IS_CLOSED: Method = Method::new(Some(C::Connection), "is_closed", &[], 19);
}

pub mod statement {
    use super::*;

    pub static EXECUTE: Method = Method::new(Some(C::Statement), "execute", &[P::Text], 20);
    pub static EXECUTE_QUERY: Method =
        Method::new(Some(C::Statement), "execute_query", &[P::Text], 21);
    pub static EXECUTE_UPDATE: Method =
        Method::new(Some(C::Statement), "execute_update", &[P::Text], 22);
    pub static ADD_BATCH: Method = Method::new(Some(C::Statement), "add_batch", &[P::Text], 23);
    pub static EXECUTE_BATCH: Method = Method::new(Some(C::Statement), "execute_batch", &[], 24);
    pub static UPDATE_COUNT: Method = Method::new(Some(C::Statement), "update_count", &[], 25);
    pub static SET_MAX_ROWS: Method = Method::new(Some(C::Statement), "set_max_rows", &[P::Int], 26);
    pub static CLOSE: Method = Method::new(Some(C::Statement), "close", &[], 27);
    pub static IS_CLOSED: Method = Method::new(Some(C::Statement), "is_closed", &[], 28);
}

pub mod prepared_statement {
    use super::*;

    pub static EXECUTE: Method = Method::new(Some(C::PreparedStatement), "execute", &[], 29);
    pub static EXECUTE_QUERY: Method =
        Method::new(Some(C::PreparedStatement), "execute_query", &[], 30);
    pub static EXECUTE_UPDATE: Method =
        Method::new(Some(C::PreparedStatement), "execute_update", &[], 31);
    pub static SET_NULL: Method = Method::new(Some(C::PreparedStatement), "set_null", &[P::Int], 32);
    pub static SET_INT: Method =
        Method::new(Some(C::PreparedStatement), "set_int", &[P::Int, P::Int], 33);
    pub static SET_LONG: Method =
        Method::new(Some(C::PreparedStatement), "set_long", &[P::Int, P::Long], 34);
    pub static SET_STRING: Method =
        Method::new(Some(C::PreparedStatement), "set_string", &[P::Int, P::Text], 35);
    pub static CLEAR_PARAMETERS: Method =
        Method::new(Some(C::PreparedStatement), "clear_parameters", &[], 36);
}

pub mod callable_statement {
    use super::*;

    pub static REGISTER_OUT_PARAMETER: Method = Method::new(
        Some(C::CallableStatement),
        "register_out_parameter",
        &[P::Int, P::Int],
        37,
    );
    pub static GET_OUT_STRING: Method =
        Method::new(Some(C::CallableStatement), "get_out_string", &[P::Int], 38);
    pub static GET_OUT_LONG: Method =
        Method::new(Some(C::CallableStatement), "get_out_long", &[P::Int], 39);
    pub static OUT_WAS_NULL: Method =
        Method::new(Some(C::CallableStatement), "out_was_null", &[], 40);
}

pub mod result_set {
    use super::*;

    pub static NEXT: Method = Method::new(Some(C::ResultSet), "next", &[], 41);
    pub static GET_STRING: Method = Method::new(Some(C::ResultSet), "get_string", &[P::Int], 42);
    pub static GET_INT: Method = Method::new(Some(C::ResultSet), "get_int", &[P::Int], 43);
    pub static GET_LONG: Method = Method::new(Some(C::ResultSet), "get_long", &[P::Int], 44);
    pub static GET_DOUBLE: Method = Method::new(Some(C::ResultSet), "get_double", &[P::Int], 45);
    pub static FIND_COLUMN: Method = Method::new(Some(C::ResultSet), "find_column", &[P::Text], 46);
    pub static WAS_NULL: Method = Method::new(Some(C::ResultSet), "was_null", &[], 47);
    pub static CLOSE: Method = Method::new(Some(C::ResultSet), "close", &[], 48);
    pub static IS_CLOSED: Method = Method::new(Some(C::ResultSet), "is_closed", &[], 49);
}

pub mod row_set {
    use super::*;

    pub static COMMAND: Method = Method::new(Some(C::RowSet), "command", &[], 50);
    pub static SET_COMMAND: Method = Method::new(Some(C::RowSet), "set_command", &[P::Text], 51);
    pub static EXECUTE: Method = Method::new(Some(C::RowSet), "execute", &[], 52);
}

pub mod jdbc_row_set {
    use super::*;

    pub static COMMIT: Method = Method::new(Some(C::JdbcRowSet), "commit", &[], 53);
    pub static ROLLBACK: Method = Method::new(Some(C::JdbcRowSet), "rollback", &[], 54);
    pub static SET_AUTO_COMMIT: Method =
        Method::new(Some(C::JdbcRowSet), "set_auto_commit", &[P::Bool], 55);
    pub static AUTO_COMMIT: Method = Method::new(Some(C::JdbcRowSet), "auto_commit", &[], 56);
}

pub mod cached_row_set {
    use super::*;

    pub static SIZE: Method = Method::new(Some(C::CachedRowSet), "size", &[], 57);
    pub static ACCEPT_CHANGES: Method = Method::new(Some(C::CachedRowSet), "accept_changes", &[], 58);
    pub static RELEASE: Method = Method::new(Some(C::CachedRowSet), "release", &[], 59);
}

pub mod web_row_set {
    use super::*;

    pub static WRITE_XML: Method = Method::new(Some(C::WebRowSet), "write_xml", &[], 60);
}

pub mod filtered_row_set {
    use super::*;

    pub static SET_FILTER: Method = Method::new(Some(C::FilteredRowSet), "set_filter", &[P::Text], 61);
    pub static FILTER: Method = Method::new(Some(C::FilteredRowSet), "filter", &[], 62);
}

pub mod join_row_set {
    use super::*;

    pub static JOIN_TYPE: Method = Method::new(Some(C::JoinRowSet), "join_type", &[], 63);
    pub static SET_JOIN_TYPE: Method = Method::new(Some(C::JoinRowSet), "set_join_type", &[P::Int], 64);
    pub static WHERE_CLAUSE: Method = Method::new(Some(C::JoinRowSet), "where_clause", &[], 65);
}

/// Number of descriptors; slots run from 0 to `COUNT - 1`.
pub const COUNT: usize = 66;

/// Every descriptor, indexed by slot.
pub static ALL: [&Method; COUNT] = [
    &wrapper::IS_WRAPPER_FOR,
    &wrapper::UNWRAP_TO,
    &common_data_source::LOGIN_TIMEOUT,
    &common_data_source::SET_LOGIN_TIMEOUT,
    &data_source::GET_CONNECTION,
    &data_source::GET_CONNECTION_WITH,
    &xa_data_source::GET_XA_CONNECTION,
    &xa_data_source::GET_XA_CONNECTION_WITH,
    &pooled_connection::GET_CONNECTION,
    &pooled_connection::CLOSE,
    &xa_connection::GET_XA_RESOURCE,
    &connection::CREATE_STATEMENT,
    &connection::PREPARE_STATEMENT,
    &connection::PREPARE_CALL,
    &connection::SET_AUTO_COMMIT,
    &connection::AUTO_COMMIT,
    &connection::COMMIT,
    &connection::ROLLBACK,
    &connection::CLOSE,
    &connection::IS_CLOSED,
    &statement::EXECUTE,
    &statement::EXECUTE_QUERY,
    &statement::EXECUTE_UPDATE,
    &statement::ADD_BATCH,
    &statement::EXECUTE_BATCH,
    &statement::UPDATE_COUNT,
    &statement::SET_MAX_ROWS,
    &statement::CLOSE,
    &statement::IS_CLOSED,
    &prepared_statement::EXECUTE,
    &prepared_statement::EXECUTE_QUERY,
    &prepared_statement::EXECUTE_UPDATE,
    &prepared_statement::SET_NULL,
    &prepared_statement::SET_INT,
    &prepared_statement::SET_LONG,
    &prepared_statement::SET_STRING,
    &prepared_statement::CLEAR_PARAMETERS,
    &callable_statement::REGISTER_OUT_PARAMETER,
    &callable_statement::GET_OUT_STRING,
    &callable_statement::GET_OUT_LONG,
    &callable_statement::OUT_WAS_NULL,
    &result_set::NEXT,
    &result_set::GET_STRING,
    &result_set::GET_INT,
    &result_set::GET_LONG,
    &result_set::GET_DOUBLE,
    &result_set::FIND_COLUMN,
    &result_set::WAS_NULL,
    &result_set::CLOSE,
    &result_set::IS_CLOSED,
    &row_set::COMMAND,
    &row_set::SET_COMMAND,
    &row_set::EXECUTE,
    &jdbc_row_set::COMMIT,
    &jdbc_row_set::ROLLBACK,
    &jdbc_row_set::SET_AUTO_COMMIT,
    &jdbc_row_set::AUTO_COMMIT,
    &cached_row_set::SIZE,
    &cached_row_set::ACCEPT_CHANGES,
    &cached_row_set::RELEASE,
    &web_row_set::WRITE_XML,
    &filtered_row_set::SET_FILTER,
    &filtered_row_set::FILTER,
    &join_row_set::JOIN_TYPE,
    &join_row_set::SET_JOIN_TYPE,
    &join_row_set::WHERE_CLAUSE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_match_positions() {
        for (index, method) in ALL.iter().enumerate() {
            assert_eq!(method.slot as usize, index, "{method:?}");
        }
    }

    #[test]
    fn routing_fits_in_u128() {
        assert!(COUNT <= 128);
    }

    #[test]
    fn overloads_share_names() {
        assert_eq!(statement::EXECUTE.name, prepared_statement::EXECUTE.name);
        assert_ne!(statement::EXECUTE, prepared_statement::EXECUTE);
        assert!(statement::EXECUTE.matches("execute", &[ParamKind::Text]));
        assert!(!prepared_statement::EXECUTE.matches("execute", &[ParamKind::Text]));
    }

    #[test]
    fn owners_are_declaring_contracts() {
        assert_eq!(connection::CLOSE.owner, Some(Capability::Connection));
        assert_eq!(wrapper::UNWRAP_TO.owner, None);
        assert_eq!(
            format!("{:?}", statement::EXECUTE),
            "Statement::execute[Text]"
        );
    }
}
