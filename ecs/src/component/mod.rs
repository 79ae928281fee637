//! Component types, identity, and type-erasure support.
//!
//! A component is plain data attached to an entity. Every component type is
//! assigned a small stable [`Id`] on registration; ids index signature bits,
//! pool maps, and the migrate/drop callback table.

mod callbacks;
mod registry;

pub use callbacks::{Callbacks, DropFn, MigrateFn};
pub use registry::Registry;

/// A trait representing a type that can be used as a component.
pub trait Component: 'static + Sized + Send + Sync {}

/// A component type identifier, assigned once per type by the [`Registry`].
///
/// Ids are dense and start at zero, so they double as bit positions in a
/// [`crate::Signature`] and as indices into the callback table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Creates a new component id from the given value.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Gets the id value as a `usize` for indexing.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<usize> for Id {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}
