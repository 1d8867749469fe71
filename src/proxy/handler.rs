//! Call interception contract.

use std::fmt;

use crate::driver::{DriverObject, Value};
use crate::error::DriverResult;
use crate::proxy::invocation::Invocation;
use crate::proxy::methods::{self, Method, ParamKind};

/// Which calls a handler wants to see.
///
/// Strategies that support it forward calls outside the filter straight to
/// the delegate without building an [`Invocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationFilter {
    /// Intercept every call.
    All,
    /// Intercept nothing.
    Nothing,
    /// Intercept calls with any of these names, whatever their parameters.
    Names(&'static [&'static str]),
    /// Intercept calls matching one of these name and parameter shapes.
    Signatures(&'static [(&'static str, &'static [ParamKind])]),
}

impl InvocationFilter {
    /// Whether calls of `method` are intercepted.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            InvocationFilter::All => true,
            InvocationFilter::Nothing => false,
            InvocationFilter::Names(names) => names.contains(&method.name),
            InvocationFilter::Signatures(signatures) => signatures
                .iter()
                .any(|(name, params)| method.matches(name, params)),
        }
    }

    /// Bit `slot` is set for every intercepted method.
    pub fn routing(&self) -> u128 {
        methods::ALL
            .iter()
            .filter(|method| self.accepts(method))
            .fold(0u128, |bits, method| bits | (1u128 << method.slot))
    }
}

/// Receives the calls made on an adapter.
///
/// A handler wraps exactly one delegate for its whole life.
pub trait InvocationHandler: Send + Sync + fmt::Debug {
    /// The real object calls are forwarded to.
    fn delegate(&self) -> &DriverObject;

    /// Calls this handler intercepts.
    fn invocation_filter(&self) -> &InvocationFilter {
        &InvocationFilter::All
    }

    /// Handles one call. Implementations forward with
    /// [`Invocation::proceed`] and may act before and after.
    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value>;
}

/// Handler that forwards everything unchanged.
#[derive(Debug, Clone)]
pub struct ForwardingHandler {
    delegate: DriverObject,
}

impl ForwardingHandler {
    pub fn new(delegate: DriverObject) -> Self {
        Self { delegate }
    }
}

impl InvocationHandler for ForwardingHandler {
    fn delegate(&self) -> &DriverObject {
        &self.delegate
    }

    fn invocation_filter(&self) -> &InvocationFilter {
        &InvocationFilter::Nothing
    }

    fn invoke(&self, invocation: Invocation<'_>) -> DriverResult<Value> {
        invocation.proceed()
    }
}
