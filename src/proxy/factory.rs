//! Adapter synthesis strategies.
//!
//! ## Architecture
//!
//! ```text
//!   new_adapter(handler, set)
//!        │
//!        ├─ Reflective        synthesize shape ─────────────────────────┐
//!        ├─ CachedReflective  BoundedCache<CapabilitySet, shape> ───────┤
//!        └─ ClassSynthesis    DashMap<CapabilitySet, shape + routing> ──┤
//!                                                                        ▼
//!                                   check delegate satisfies set, Proxy::new
//! ```
//!
//! An [`AdapterShape`] is the recipe for an adapter: which contracts it can be
//! viewed as and which calls go through the handler. The reflective shapes
//! route every call through the handler; the class-synthesis shape routes
//! only the calls the handler's [`InvocationFilter`] accepts and sends the
//! rest straight to the delegate.
//!
//! The class-synthesis recipe is keyed by the capability set alone, so its
//! routing table comes from the filter of the first handler that asked for
//! that set.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::BoundedCache;
use crate::config::keys;
use crate::driver::{Capability, CapabilityMask, DriverObject};
use crate::error::{AdapterError, ConfigError};
use crate::proxy::adapter::Proxy;
use crate::proxy::capability::CapabilitySet;
use crate::proxy::handler::{InvocationFilter, InvocationHandler};
use crate::proxy::methods::Method;

// ---------------------------------------------------------------------------
// AdapterShape
// ---------------------------------------------------------------------------

/// Recipe for adapters implementing one capability set.
#[derive(Debug)]
pub struct AdapterShape {
    set: CapabilitySet,
    views: CapabilityMask,
    routing: u128,
}

impl AdapterShape {
    /// Builds the recipe for `set`. Without a filter every call is routed
    /// through the handler.
    pub fn synthesize(
        set: &CapabilitySet,
        filter: Option<&InvocationFilter>,
    ) -> Result<Self, AdapterError> {
        if set.is_empty() {
            return Err(AdapterError::EmptyCapabilitySet);
        }
        let routing = filter.map_or(u128::MAX, InvocationFilter::routing);
        debug!(
            capabilities = ?set.capabilities(),
            scope = set.scope().as_str(),
            intercepted = routing.count_ones(),
            "synthesized adapter shape"
        );
        Ok(Self {
            set: set.clone(),
            views: set.views(),
            routing,
        })
    }

    #[inline]
    pub fn set(&self) -> &CapabilitySet {
        &self.set
    }

    /// Contracts an adapter of this shape can be viewed as.
    #[inline]
    pub fn views(&self) -> CapabilityMask {
        self.views
    }

    /// Whether calls of `method` go through the handler.
    #[inline]
    pub fn intercepts(&self, method: &Method) -> bool {
        self.routing & (1u128 << method.slot) != 0
    }

    /// Fails when `delegate` cannot back every contract of the set.
    pub fn check_delegate(&self, delegate: &DriverObject) -> Result<(), AdapterError> {
        match self
            .set
            .capabilities()
            .iter()
            .find(|capability| !delegate.satisfies(**capability))
        {
            Some(capability) => Err(AdapterError::Unsatisfied {
                capability: *capability,
                delegate: delegate.capability(),
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// AdapterFactory
// ---------------------------------------------------------------------------

/// Builds adapters that implement a capability set and route calls to a
/// handler.
pub trait AdapterFactory: Send + Sync + fmt::Debug {
    fn strategy(&self) -> SynthesisStrategy;

    /// Builds an adapter for `set` over `handler`'s delegate.
    fn new_adapter(
        &self,
        handler: Arc<dyn InvocationHandler>,
        set: &CapabilitySet,
    ) -> Result<Arc<Proxy>, AdapterError>;

    /// Builds an adapter and views it as `view`.
    fn new_object(
        &self,
        handler: Arc<dyn InvocationHandler>,
        set: &CapabilitySet,
        view: Capability,
    ) -> Result<DriverObject, AdapterError> {
        self.new_adapter(handler, set)?.view(view)
    }
}

fn instantiate(
    handler: Arc<dyn InvocationHandler>,
    shape: Arc<AdapterShape>,
) -> Result<Arc<Proxy>, AdapterError> {
    shape.check_delegate(handler.delegate())?;
    Ok(Proxy::new(handler, shape))
}

/// Synthesizes a fresh shape on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflectiveFactory;

impl AdapterFactory for ReflectiveFactory {
    fn strategy(&self) -> SynthesisStrategy {
        SynthesisStrategy::Reflective
    }

    fn new_adapter(
        &self,
        handler: Arc<dyn InvocationHandler>,
        set: &CapabilitySet,
    ) -> Result<Arc<Proxy>, AdapterError> {
        let shape = Arc::new(AdapterShape::synthesize(set, None)?);
        instantiate(handler, shape)
    }
}

type ShapeLoader = fn(&CapabilitySet) -> Result<Arc<AdapterShape>, AdapterError>;

fn load_shape(set: &CapabilitySet) -> Result<Arc<AdapterShape>, AdapterError> {
    AdapterShape::synthesize(set, None).map(Arc::new)
}

/// Reflective synthesis behind an unbounded [`BoundedCache`].
pub struct CachedReflectiveFactory {
    shapes: BoundedCache<CapabilitySet, Arc<AdapterShape>, ShapeLoader>,
}

impl CachedReflectiveFactory {
    pub fn new() -> Self {
        Self {
            shapes: BoundedCache::new(load_shape as ShapeLoader, None, None),
        }
    }

    /// Number of cached shapes.
    pub fn recipe_count(&self) -> usize {
        self.shapes.len()
    }
}

impl Default for CachedReflectiveFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CachedReflectiveFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedReflectiveFactory")
            .field("shapes", &self.shapes)
            .finish()
    }
}

impl AdapterFactory for CachedReflectiveFactory {
    fn strategy(&self) -> SynthesisStrategy {
        SynthesisStrategy::CachedReflective
    }

    fn new_adapter(
        &self,
        handler: Arc<dyn InvocationHandler>,
        set: &CapabilitySet,
    ) -> Result<Arc<Proxy>, AdapterError> {
        let shape = self.shapes.get(set)?;
        instantiate(handler, shape)
    }
}

/// Generates one routed shape per capability set and keeps it in a
/// concurrent map. Racing misses may each synthesize; the last insert wins.
#[derive(Debug, Default)]
pub struct ClassSynthesisFactory {
    recipes: DashMap<CapabilitySet, Arc<AdapterShape>>,
}

impl ClassSynthesisFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached recipes.
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    fn recipe(
        &self,
        set: &CapabilitySet,
        filter: &InvocationFilter,
    ) -> Result<Arc<AdapterShape>, AdapterError> {
        let cached = self.recipes.get(set).map(|entry| Arc::clone(entry.value()));
        if let Some(shape) = cached {
            return Ok(shape);
        }
        let shape = Arc::new(AdapterShape::synthesize(set, Some(filter))?);
        self.recipes.insert(set.clone(), Arc::clone(&shape));
        Ok(shape)
    }
}

impl AdapterFactory for ClassSynthesisFactory {
    fn strategy(&self) -> SynthesisStrategy {
        SynthesisStrategy::ClassSynthesis
    }

    fn new_adapter(
        &self,
        handler: Arc<dyn InvocationHandler>,
        set: &CapabilitySet,
    ) -> Result<Arc<Proxy>, AdapterError> {
        let shape = self.recipe(set, handler.invocation_filter())?;
        instantiate(handler, shape)
    }
}

// ---------------------------------------------------------------------------
// SynthesisStrategy
// ---------------------------------------------------------------------------

/// Selects an [`AdapterFactory`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SynthesisStrategy {
    #[default]
    Reflective,
    CachedReflective,
    ClassSynthesis,
}

impl SynthesisStrategy {
    pub const fn name(self) -> &'static str {
        match self {
            SynthesisStrategy::Reflective => "reflective",
            SynthesisStrategy::CachedReflective => "cached_reflective",
            SynthesisStrategy::ClassSynthesis => "class_synthesis",
        }
    }

    /// A new factory of this kind.
    pub fn factory(self) -> Arc<dyn AdapterFactory> {
        match self {
            SynthesisStrategy::Reflective => Arc::new(ReflectiveFactory),
            SynthesisStrategy::CachedReflective => Arc::new(CachedReflectiveFactory::new()),
            SynthesisStrategy::ClassSynthesis => Arc::new(ClassSynthesisFactory::new()),
        }
    }
}

impl fmt::Display for SynthesisStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SynthesisStrategy {
    type Err = ConfigError;

    /// Case-insensitive; also accepts `default`, `cache` and `cglib`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reflective" | "default" => Ok(SynthesisStrategy::Reflective),
            "cached_reflective" | "cache" => Ok(SynthesisStrategy::CachedReflective),
            "class_synthesis" | "cglib" => Ok(SynthesisStrategy::ClassSynthesis),
            _ => Err(ConfigError::new(keys::SYNTHESIS_STRATEGY, s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::methods::{connection, statement};

    #[test]
    fn empty_set_is_rejected() {
        let err = AdapterShape::synthesize(&CapabilitySet::of([]), None).unwrap_err();
        assert_eq!(err, AdapterError::EmptyCapabilitySet);
    }

    #[test]
    fn reflective_shape_routes_everything() {
        let shape =
            AdapterShape::synthesize(&CapabilitySet::single(Capability::Connection), None)
                .unwrap();
        assert!(shape.intercepts(&connection::COMMIT));
        assert!(shape.views().contains(Capability::Connection));
    }

    #[test]
    fn filtered_shape_routes_only_accepted_calls() {
        let filter = InvocationFilter::Names(&["close"]);
        let shape = AdapterShape::synthesize(
            &CapabilitySet::single(Capability::Statement),
            Some(&filter),
        )
        .unwrap();
        assert!(shape.intercepts(&statement::CLOSE));
        assert!(!shape.intercepts(&statement::EXECUTE));
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(
            "Reflective".parse::<SynthesisStrategy>().unwrap(),
            SynthesisStrategy::Reflective
        );
        assert_eq!(
            "cache".parse::<SynthesisStrategy>().unwrap(),
            SynthesisStrategy::CachedReflective
        );
        assert_eq!(
            "CGLIB".parse::<SynthesisStrategy>().unwrap(),
            SynthesisStrategy::ClassSynthesis
        );
        let err = "bytecode".parse::<SynthesisStrategy>().unwrap_err();
        assert_eq!(err.key(), keys::SYNTHESIS_STRATEGY);
        assert_eq!(err.value(), "bytecode");
    }

    #[test]
    fn factories_report_their_strategy() {
        for strategy in [
            SynthesisStrategy::Reflective,
            SynthesisStrategy::CachedReflective,
            SynthesisStrategy::ClassSynthesis,
        ] {
            assert_eq!(strategy.factory().strategy(), strategy);
            assert_eq!(strategy.name().parse::<SynthesisStrategy>().unwrap(), strategy);
        }
    }
}
