//! Per-call record handed to an [`InvocationHandler`](crate::proxy::InvocationHandler).

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::driver::{Capability, DriverObject, Value};
use crate::error::{DriverError, DriverResult};
use crate::proxy::methods::Method;

/// Identity of the adapter an invocation came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterId(pub u64);

type Target<'a> = Box<dyn FnOnce() -> DriverResult<Value> + Send + 'a>;

/// One intercepted call: what was called, on what, with which arguments, and
/// how to forward it to the real object.
///
/// An invocation is consumed by forwarding it, so a call is forwarded at most
/// once.
pub struct Invocation<'a> {
    delegate: &'a DriverObject,
    adapter: AdapterId,
    method: &'static Method,
    args: Vec<Value>,
    target: Target<'a>,
}

impl<'a> Invocation<'a> {
    /// Records a call of `method` with `args`; `target` performs the same call
    /// on the real object.
    pub fn new(
        delegate: &'a DriverObject,
        adapter: AdapterId,
        method: &'static Method,
        args: Vec<Value>,
        target: impl FnOnce() -> DriverResult<Value> + Send + 'a,
    ) -> Self {
        Self {
            delegate,
            adapter,
            method,
            args,
            target: Box::new(target),
        }
    }

    /// The real object behind the adapter.
    #[inline]
    pub fn delegate(&self) -> &'a DriverObject {
        self.delegate
    }

    #[inline]
    pub fn adapter(&self) -> AdapterId {
        self.adapter
    }

    #[inline]
    pub fn method(&self) -> &'static Method {
        self.method
    }

    #[inline]
    pub fn method_name(&self) -> &'static str {
        self.method.name
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Argument `index` as text.
    pub fn arg_str(&self, index: usize) -> DriverResult<&str> {
        self.arg(index)
            .and_then(Value::as_str)
            .ok_or(DriverError::TypeMismatch {
                method: self.method.name,
                expected: "text argument",
            })
    }

    /// Argument `index` as a capability.
    pub fn arg_capability(&self, index: usize) -> DriverResult<Capability> {
        match self.arg(index) {
            Some(Value::Capability(capability)) => Ok(*capability),
            _ => Err(DriverError::TypeMismatch {
                method: self.method.name,
                expected: "capability argument",
            }),
        }
    }

    /// Forwards the call to the real object. Failures come back unchanged.
    pub fn proceed(self) -> DriverResult<Value> {
        (self.target)()
    }

    /// Forwards the call, turning a panic in the delegate into
    /// [`DriverError::Unexpected`].
    pub fn call(self) -> DriverResult<Value> {
        let method = self.method.name;
        match panic::catch_unwind(AssertUnwindSafe(|| self.proceed())) {
            Ok(result) => result,
            Err(payload) => Err(DriverError::Unexpected(format!(
                "{method} panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Forwards the call on the current thread and discards its outcome,
    /// failures included. Callers that want the call off their own thread
    /// move the invocation into their executor and call `run` there.
    pub fn run(self) {
        let method = self.method.name;
        if let Err(error) = self.call() {
            debug!(method, %error, "discarded failure of detached invocation");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("delegate", self.delegate)
            .field("adapter", &self.adapter)
            .field("method", self.method)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
