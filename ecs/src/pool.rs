//! Dense per-type component storage.

use std::any::Any;
use std::collections::HashMap;

use crate::component::Component;
use crate::entity::Handle;

/// Contiguous storage for one component type within one archetype.
///
/// Values are kept packed in a dense vector for cache-friendly iteration. A
/// forward map takes an entity handle to its slot, and a reverse vector takes
/// a slot back to its entity. Removal swaps the last value into the vacated
/// slot and pops, so both insert and remove are O(1) amortized. Slot order is
/// never meaningful to callers.
#[derive(Debug, Default)]
pub struct ComponentPool<C: Component> {
    values: Vec<C>,
    index_of: HashMap<Handle, usize>,
    handles: Vec<Handle>,
}

impl<C: Component> ComponentPool<C> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            index_of: HashMap::new(),
            handles: Vec::new(),
        }
    }

    /// Stores a value for an entity. If the entity already has a value in
    /// this pool it is overwritten in place; the slot does not move.
    pub fn add(&mut self, entity: Handle, value: C) {
        if let Some(&index) = self.index_of.get(&entity) {
            self.values[index] = value;
        } else {
            self.index_of.insert(entity, self.values.len());
            self.values.push(value);
            self.handles.push(entity);
        }
        self.verify_dense();
    }

    /// Removes and returns the entity's value, or `None` if it holds none.
    ///
    /// The last value in the pool is swapped into the vacated slot to keep
    /// the storage dense, and the forward map is patched for the moved
    /// entity.
    pub fn remove(&mut self, entity: Handle) -> Option<C> {
        let index = self.index_of.remove(&entity)?;
        let value = self.values.swap_remove(index);
        self.handles.swap_remove(index);
        if index < self.handles.len() {
            let moved = self.handles[index];
            self.index_of.insert(moved, index);
        }
        self.verify_dense();
        Some(value)
    }

    /// Gets a reference to the entity's value, if present.
    #[inline]
    pub fn get(&self, entity: Handle) -> Option<&C> {
        self.index_of.get(&entity).map(|&index| &self.values[index])
    }

    /// Gets a mutable reference to the entity's value, if present.
    #[inline]
    pub fn get_mut(&mut self, entity: Handle) -> Option<&mut C> {
        self.index_of
            .get(&entity)
            .map(|&index| &mut self.values[index])
    }

    /// Returns whether the entity holds a value in this pool.
    #[inline]
    pub fn contains(&self, entity: Handle) -> bool {
        self.index_of.contains_key(&entity)
    }

    /// The entities with values in this pool, in slot order.
    #[inline]
    pub fn entities(&self) -> &[Handle] {
        &self.handles
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the pool holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(debug_assertions)]
    fn verify_dense(&self) {
        debug_assert_eq!(self.values.len(), self.handles.len());
        debug_assert_eq!(self.values.len(), self.index_of.len());
        for (index, handle) in self.handles.iter().enumerate() {
            debug_assert_eq!(self.index_of.get(handle), Some(&index));
        }
    }

    #[cfg(not(debug_assertions))]
    fn verify_dense(&self) {}
}

/// The type-erased view of a pool, as stored by an archetype.
///
/// Operations that need the concrete component type (adding, taking, reading
/// values) go through [`Any`] downcasts; membership and bookkeeping queries
/// are available without knowing the type.
pub trait PoolOps: Any + Send + Sync {
    /// Returns whether the entity holds a value in this pool.
    fn contains(&self, entity: Handle) -> bool;

    /// The entities with values in this pool, in slot order.
    fn entities(&self) -> &[Handle];

    /// Number of stored values.
    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> PoolOps for ComponentPool<C> {
    fn contains(&self, entity: Handle) -> bool {
        ComponentPool::contains(self, entity)
    }

    fn entities(&self) -> &[Handle] {
        ComponentPool::entities(self)
    }

    fn len(&self) -> usize {
        ComponentPool::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
