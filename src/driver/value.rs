//! Dynamically typed arguments and results of intercepted calls.

use std::fmt;
use std::sync::Arc;

use crate::driver::capability::Capability;
use crate::driver::object::DriverObject;
use crate::driver::traits::{
    CallableStatement, Connection, PreparedStatement, ResultSet, Statement, XaConnection,
    XaResource,
};
use crate::error::{DriverError, DriverResult};

/// One argument or return value of a protocol call.
#[derive(Clone)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Usize(usize),
    Text(String),
    Longs(Vec<i64>),
    Capability(Capability),
    Object(DriverObject),
    XaResource(Arc<dyn XaResource>),
}

impl Value {
    /// Short name of the value's shape, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Usize(_) => "usize",
            Value::Text(_) => "text",
            Value::Longs(_) => "longs",
            Value::Capability(_) => "capability",
            Value::Object(_) => "object",
            Value::XaResource(_) => "xa resource",
        }
    }

    /// Borrows a text argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DriverObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_unit(self, method: &'static str) -> DriverResult<()> {
        match self {
            Value::Unit => Ok(()),
            _ => Err(mismatch(method, "unit")),
        }
    }

    pub fn into_bool(self, method: &'static str) -> DriverResult<bool> {
        match self {
            Value::Bool(value) => Ok(value),
            _ => Err(mismatch(method, "bool")),
        }
    }

    pub fn into_int(self, method: &'static str) -> DriverResult<i32> {
        match self {
            Value::Int(value) => Ok(value),
            _ => Err(mismatch(method, "int")),
        }
    }

    pub fn into_long(self, method: &'static str) -> DriverResult<i64> {
        match self {
            Value::Long(value) => Ok(value),
            _ => Err(mismatch(method, "long")),
        }
    }

    pub fn into_double(self, method: &'static str) -> DriverResult<f64> {
        match self {
            Value::Double(value) => Ok(value),
            _ => Err(mismatch(method, "double")),
        }
    }

    pub fn into_usize(self, method: &'static str) -> DriverResult<usize> {
        match self {
            Value::Usize(value) => Ok(value),
            _ => Err(mismatch(method, "usize")),
        }
    }

    pub fn into_text(self, method: &'static str) -> DriverResult<String> {
        match self {
            Value::Text(value) => Ok(value),
            _ => Err(mismatch(method, "text")),
        }
    }

    /// Text that may be SQL `NULL`.
    pub fn into_opt_text(self, method: &'static str) -> DriverResult<Option<String>> {
        match self {
            Value::Text(value) => Ok(Some(value)),
            Value::Null => Ok(None),
            _ => Err(mismatch(method, "text or null")),
        }
    }

    pub fn into_longs(self, method: &'static str) -> DriverResult<Vec<i64>> {
        match self {
            Value::Longs(value) => Ok(value),
            _ => Err(mismatch(method, "longs")),
        }
    }

    pub fn into_capability(self, method: &'static str) -> DriverResult<Capability> {
        match self {
            Value::Capability(value) => Ok(value),
            _ => Err(mismatch(method, "capability")),
        }
    }

    pub fn into_object(self, method: &'static str) -> DriverResult<DriverObject> {
        match self {
            Value::Object(value) => Ok(value),
            _ => Err(mismatch(method, "object")),
        }
    }

    pub fn into_xa_resource(self, method: &'static str) -> DriverResult<Arc<dyn XaResource>> {
        match self {
            Value::XaResource(value) => Ok(value),
            _ => Err(mismatch(method, "xa resource")),
        }
    }
}

fn mismatch(method: &'static str, expected: &'static str) -> DriverError {
    DriverError::TypeMismatch { method, expected }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("Unit"),
            Value::Null => f.write_str("Null"),
            Value::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Value::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Value::Long(value) => f.debug_tuple("Long").field(value).finish(),
            Value::Double(value) => f.debug_tuple("Double").field(value).finish(),
            Value::Usize(value) => f.debug_tuple("Usize").field(value).finish(),
            Value::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Value::Longs(value) => f.debug_tuple("Longs").field(value).finish(),
            Value::Capability(value) => f.debug_tuple("Capability").field(value).finish(),
            Value::Object(value) => f.debug_tuple("Object").field(value).finish(),
            Value::XaResource(_) => f.write_str("XaResource(..)"),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Usize(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::Text)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::Longs(value)
    }
}

impl From<Capability> for Value {
    fn from(value: Capability) -> Self {
        Value::Capability(value)
    }
}

impl From<DriverObject> for Value {
    fn from(value: DriverObject) -> Self {
        Value::Object(value)
    }
}

impl From<Arc<dyn XaResource>> for Value {
    fn from(value: Arc<dyn XaResource>) -> Self {
        Value::XaResource(value)
    }
}

// ---------------------------------------------------------------------------
// CallValue
// ---------------------------------------------------------------------------

/// Typed return value of a protocol call, convertible to and from [`Value`].
pub trait CallValue: Sized {
    fn into_value(self) -> Value;

    /// Converts back, failing with [`DriverError::TypeMismatch`] naming
    /// `method` when the value has the wrong shape.
    fn from_value(value: Value, method: &'static str) -> DriverResult<Self>;
}

macro_rules! call_value {
    ($($ty:ty => $into:ident),* $(,)?) => {
        $(
            impl CallValue for $ty {
                #[inline]
                fn into_value(self) -> Value {
                    Value::from(self)
                }

                #[inline]
                fn from_value(value: Value, method: &'static str) -> DriverResult<Self> {
                    value.$into(method)
                }
            }
        )*
    };
}

call_value! {
    () => into_unit,
    bool => into_bool,
    i32 => into_int,
    i64 => into_long,
    f64 => into_double,
    usize => into_usize,
    String => into_text,
    Option<String> => into_opt_text,
    Vec<i64> => into_longs,
    DriverObject => into_object,
    Arc<dyn XaResource> => into_xa_resource,
}

macro_rules! call_value_object {
    ($($contract:ident => $view:ident),* $(,)?) => {
        $(
            impl CallValue for Arc<dyn $contract> {
                #[inline]
                fn into_value(self) -> Value {
                    Value::Object(DriverObject::from(self))
                }

                fn from_value(value: Value, method: &'static str) -> DriverResult<Self> {
                    value
                        .into_object(method)?
                        .$view()
                        .ok_or_else(|| mismatch(method, stringify!($contract)))
                }
            }
        )*
    };
}

call_value_object! {
    Connection => as_connection,
    XaConnection => as_xa_connection,
    Statement => as_statement,
    PreparedStatement => as_prepared_statement,
    CallableStatement => as_callable_statement,
    ResultSet => as_result_set,
}
