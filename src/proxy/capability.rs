//! Capability-set identity: the key under which adapter recipes are cached.
//!
//! A [`CapabilitySet`] is a scope token plus the contracts an adapter must
//! implement. The contract list is canonicalized (sorted by ordinal,
//! duplicates dropped) when the set is built, so two sets naming the same
//! contracts in a different order are equal and hash alike.
//!
//! The hash is computed once at construction: the scope's hash folded
//! positionally with each contract's ordinal (`h = 31 * h + ordinal + 1`).
//! Equality compares that hash first and only then scope and contract list.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::driver::{Capability, CapabilityMask};

/// Namespace an adapter recipe belongs to.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Scope(Arc<str>);

impl Scope {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Scope(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn stable_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new("default")
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({:?})", &*self.0)
    }
}

/// Immutable `(scope, contracts)` identity.
#[derive(Clone)]
pub struct CapabilitySet {
    scope: Scope,
    capabilities: Arc<[Capability]>,
    hash: u64,
}

impl CapabilitySet {
    /// Builds the canonical set for `capabilities` in `scope`.
    pub fn new(scope: Scope, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let mut list: Vec<Capability> = capabilities.into_iter().collect();
        list.sort_unstable();
        list.dedup();

        let hash = list.iter().fold(scope.stable_hash(), |h, capability| {
            h.wrapping_mul(31)
                .wrapping_add(u64::from(capability.ordinal()) + 1)
        });
        Self {
            scope,
            capabilities: list.into(),
            hash,
        }
    }

    /// Set of `capabilities` in the default scope.
    pub fn of(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self::new(Scope::default(), capabilities)
    }

    /// Set holding one contract, in the default scope.
    pub fn single(capability: Capability) -> Self {
        Self::of([capability])
    }

    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Contracts in canonical (ordinal) order.
    #[inline]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.capabilities.binary_search(&capability).is_ok()
    }

    /// Every contract an adapter for this set can be viewed as: the listed
    /// contracts and all their ancestors.
    pub fn views(&self) -> CapabilityMask {
        self.capabilities
            .iter()
            .fold(CapabilityMask::EMPTY, |mask, capability| {
                mask.union(capability.closure())
            })
    }
}

impl PartialEq for CapabilitySet {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.scope == other.scope
            && self.capabilities == other.capabilities
    }
}

impl Eq for CapabilitySet {}

impl Hash for CapabilitySet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("scope", &self.scope)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
