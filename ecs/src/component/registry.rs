//! Registry mapping Rust types to stable component ids.

use std::any::TypeId;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

use crate::MAX_COMPONENTS;
use crate::component::{Component, Id};

/// Assigns each component type a dense [`Id`], starting at zero, the first
/// time it is registered. Subsequent registrations of the same type return
/// the same id.
///
/// At most [`MAX_COMPONENTS`] distinct types may be registered; exceeding the
/// cap is a configuration error and panics.
#[derive(Debug, Default)]
pub struct Registry {
    ids: DashMap<TypeId, Id>,
    next: AtomicU32,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    /// Registers a component type, returning its id. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if this registration would exceed [`MAX_COMPONENTS`] distinct
    /// types.
    pub fn register<C: Component>(&self) -> Id {
        *self.ids.entry(TypeId::of::<C>()).or_insert_with(|| {
            let value = self.next.fetch_add(1, Ordering::Relaxed);
            if value as usize >= MAX_COMPONENTS {
                panic!(
                    "component type capacity exceeded: at most {} distinct component types \
                     may be registered",
                    MAX_COMPONENTS
                );
            }
            Id::new(value)
        })
    }

    /// Gets the id for a component type, if it has been registered.
    pub fn get_of<C: Component>(&self) -> Option<Id> {
        self.ids.get(&TypeId::of::<C>()).map(|id| *id)
    }

    /// Number of component types registered so far.
    ///
    /// Ids are dense, so every id handed out is in `[0, len)`.
    pub fn len(&self) -> usize {
        self.next.load(Ordering::Relaxed) as usize
    }

    /// Returns whether no component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
