//! Error types for probekit.
//!
//! ## Key Components
//!
//! - [`DriverError`]: returned by every call on a wrapped protocol object.
//!   Failures raised by the real delegate travel through unchanged as
//!   [`DriverError::Sql`].
//! - [`AdapterError`]: an adapter could not be built (or viewed) for a
//!   requested capability set. Always surfaced, never downgraded to a partial
//!   adapter.
//! - [`ConfigError`]: invalid driver-entry configuration (strategy name,
//!   identifier cache size or TTL).
//!
//! Cache loaders carry their own error type; see
//! [`CacheLoader::Error`](crate::cache::CacheLoader::Error).
//!
//! ## Example Usage
//!
//! ```
//! use probekit::error::{ConfigError, DriverError};
//!
//! let err = DriverError::sql("table not found", Some("42S02"));
//! assert_eq!(err.sql_state(), Some("42S02"));
//!
//! let bad = ConfigError::new("probe_identifier_cache_size", "ten");
//! assert!(bad.to_string().contains("probe_identifier_cache_size"));
//! ```

use thiserror::Error;

use crate::driver::Capability;

/// Result alias for wrapped protocol calls.
pub type DriverResult<T> = Result<T, DriverError>;

// ---------------------------------------------------------------------------
// AdapterError
// ---------------------------------------------------------------------------

/// Error returned when an adapter cannot be synthesized or viewed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The capability set names no capability at all.
    #[error("cannot build an adapter for an empty capability set")]
    EmptyCapabilitySet,

    /// The delegate does not satisfy one of the requested capabilities, so no
    /// forwarder can be built for it.
    #[error("delegate of kind {delegate} does not satisfy {capability}")]
    Unsatisfied {
        capability: Capability,
        delegate: Capability,
    },

    /// The adapter was asked for a view outside its capability set.
    #[error("adapter does not implement {0}")]
    NotInSet(Capability),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when driver configuration parameters are invalid.
///
/// Carries the offending property key and its raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    key: String,
    value: String,
}

impl ConfigError {
    /// Creates a new `ConfigError` for the given key and raw value.
    #[inline]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the property key that failed validation.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the rejected raw value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

// ---------------------------------------------------------------------------
// DriverError
// ---------------------------------------------------------------------------

/// Error returned by wrapped protocol calls.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Failure raised by the real driver object.
    #[error("{message}")]
    Sql {
        message: String,
        sql_state: Option<String>,
        vendor_code: i32,
    },

    /// Wrapping a freshly returned child object failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Driver entry configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The call is not supported by the target object.
    #[error("{capability} does not support {method}")]
    Unsupported {
        capability: Capability,
        method: &'static str,
    },

    /// An interception handler produced a value of the wrong shape.
    #[error("{method} returned a value that is not {expected}")]
    TypeMismatch {
        method: &'static str,
        expected: &'static str,
    },

    /// A delegate failed in a way the protocol does not describe (panic).
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DriverError {
    /// Builds a driver failure with a message and optional SQL state.
    pub fn sql(message: impl Into<String>, sql_state: Option<&str>) -> Self {
        Self::Sql {
            message: message.into(),
            sql_state: sql_state.map(str::to_owned),
            vendor_code: 0,
        }
    }

    /// Builds the failure returned when an object is asked to unwrap to a
    /// capability it does not wrap.
    pub fn not_a_wrapper(capability: Capability) -> Self {
        Self::sql(format!("not a wrapper for {capability}"), Some("HY000"))
    }

    /// Returns the SQL state of a driver failure, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Sql { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_names_key_and_value() {
        let err = ConfigError::new("probe_synthesis_strategy", "bytecode");
        assert_eq!(
            err.to_string(),
            "invalid value \"bytecode\" for probe_synthesis_strategy"
        );
        assert_eq!(err.key(), "probe_synthesis_strategy");
        assert_eq!(err.value(), "bytecode");
    }

    #[test]
    fn adapter_error_converts_into_driver_error() {
        let err: DriverError = AdapterError::NotInSet(Capability::JoinRowSet).into();
        assert!(matches!(
            err,
            DriverError::Adapter(AdapterError::NotInSet(Capability::JoinRowSet))
        ));
        assert_eq!(err.to_string(), "adapter does not implement JoinRowSet");
    }

    #[test]
    fn sql_state_only_for_driver_failures() {
        let err = DriverError::sql("boom", Some("08001"));
        assert_eq!(err.sql_state(), Some("08001"));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(DriverError::Unexpected("x".into()).sql_state(), None);
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<DriverError>();
        assert_error::<AdapterError>();
        assert_error::<ConfigError>();
    }
}
