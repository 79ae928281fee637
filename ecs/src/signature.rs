//! Fixed-width component signatures.

use std::fmt;

use fixedbitset::FixedBitSet;

use crate::{MAX_COMPONENTS, component};

/// The set of component types an entity currently carries, as a fixed-width
/// bit vector indexed by [`component::Id`]. Bit `i` set means the component
/// type with id `i` is attached.
///
/// Signatures are the keys that identify archetypes, so they hash and compare
/// by content. Two entities with equal signatures live in the same archetype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(FixedBitSet);

impl Signature {
    /// Creates an empty signature (no component types attached).
    pub fn new() -> Self {
        Self(FixedBitSet::with_capacity(MAX_COMPONENTS))
    }

    /// Returns whether the bit for the given component id is set.
    #[inline]
    pub fn test(&self, id: component::Id) -> bool {
        self.0.contains(id.index())
    }

    /// Sets the bit for the given component id.
    #[inline]
    pub fn set(&mut self, id: component::Id) {
        self.0.insert(id.index());
    }

    /// Clears the bit for the given component id.
    #[inline]
    pub fn clear(&mut self, id: component::Id) {
        self.0.set(id.index(), false);
    }

    /// Returns a copy of this signature with the given bit set.
    pub fn with(&self, id: component::Id) -> Self {
        let mut next = self.clone();
        next.set(id);
        next
    }

    /// Returns a copy of this signature with the given bit cleared.
    pub fn without(&self, id: component::Id) -> Self {
        let mut next = self.clone();
        next.clear(id);
        next
    }

    /// Number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.0.count_ones(..)
    }

    /// Returns whether no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_clear()
    }

    /// Iterates the ids of the set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = component::Id> + '_ {
        self.0.ones().map(component::Id::from)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (count, index) in self.0.ones().enumerate() {
            if count > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}
