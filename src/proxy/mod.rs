//! Interception Framework.
//!
//! ## Architecture
//!
//! ```text
//!   caller ──▶ Proxy (implements the set's contracts)
//!                │
//!                ├─ shape intercepts method? ──yes──▶ InvocationHandler::invoke(Invocation)
//!                │                                          │
//!                │                                          └─ Invocation::proceed ──▶ delegate
//!                └─ no ─────────────────────────────────────────────────────────────▶ delegate
//! ```
//!
//! ## Key Components
//!
//! - [`CapabilitySet`]: identity of "which contracts, in which scope"; the
//!   key adapter recipes are cached under.
//! - [`AdapterFactory`]: builds a [`Proxy`] for a handler and a set. Three
//!   strategies: [`ReflectiveFactory`], [`CachedReflectiveFactory`],
//!   [`ClassSynthesisFactory`].
//! - [`InvocationHandler`] / [`InvocationFilter`]: what happens on a call and
//!   which calls are worth intercepting.
//! - [`Invocation`]: one call in flight.
//! - [`methods`]: static descriptors for every protocol call.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use probekit::driver::{Capability, DriverObject, ResultSet, Wrapper};
//! use probekit::error::DriverResult;
//! use probekit::proxy::{
//!     AdapterFactory, CapabilitySet, ForwardingHandler, ReflectiveFactory,
//! };
//!
//! struct Empty;
//! impl Wrapper for Empty {}
//! impl ResultSet for Empty {
//!     fn next(&self) -> DriverResult<bool> { Ok(false) }
//!     fn get_string(&self, _: i32) -> DriverResult<Option<String>> { Ok(None) }
//!     fn close(&self) -> DriverResult<()> { Ok(()) }
//!     fn is_closed(&self) -> DriverResult<bool> { Ok(false) }
//! }
//!
//! let rows: Arc<dyn ResultSet> = Arc::new(Empty);
//! let handler = Arc::new(ForwardingHandler::new(DriverObject::from(rows)));
//! let set = CapabilitySet::single(Capability::ResultSet);
//! let wrapped = ReflectiveFactory
//!     .new_object(handler, &set, Capability::ResultSet)
//!     .unwrap();
//! assert!(!wrapped.as_result_set().unwrap().next().unwrap());
//! ```

pub mod adapter;
pub mod capability;
pub mod factory;
pub mod handler;
pub mod invocation;
pub mod methods;

pub use adapter::Proxy;
pub use capability::{CapabilitySet, Scope};
pub use factory::{
    AdapterFactory, AdapterShape, CachedReflectiveFactory, ClassSynthesisFactory,
    ReflectiveFactory, SynthesisStrategy,
};
pub use handler::{ForwardingHandler, InvocationFilter, InvocationHandler};
pub use invocation::{AdapterId, Invocation};
pub use methods::{Method, ParamKind};
