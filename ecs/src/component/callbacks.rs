//! Per-component-type migrate/drop callback table.
//!
//! The component manager is not generic over component types, yet it has to
//! move strongly-typed values between archetype pools when an entity's
//! composition changes. Registration monomorphizes one migrate and one drop
//! function per component type and stores them as plain function pointers,
//! indexed by [`component::Id`]. At migration time the manager walks the
//! signature bits and dispatches through this table without knowing any
//! concrete type.

use crate::archetype::Archetype;
use crate::component::{self, Component};
use crate::entity::Handle;

/// Moves one entity's value for a single component type out of the source
/// archetype's pool and into the destination archetype's pool.
pub type MigrateFn = fn(component::Id, Handle, &mut Archetype, &mut Archetype);

/// Removes and drops one entity's value for a single component type from an
/// archetype's pool.
pub type DropFn = fn(component::Id, Handle, &mut Archetype);

#[derive(Debug, Clone, Copy)]
struct Entry {
    migrate: MigrateFn,
    drop: DropFn,
}

/// Callback table indexed by component id.
#[derive(Debug, Default)]
pub struct Callbacks {
    entries: Vec<Option<Entry>>,
}

impl Callbacks {
    /// Creates an empty callback table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers the migrate/drop pair for a component type under its id.
    /// Idempotent: re-registering a type overwrites with identical pointers.
    pub fn register<C: Component>(&mut self, id: component::Id) {
        if id.index() >= self.entries.len() {
            self.entries.resize(id.index() + 1, None);
        }
        self.entries[id.index()] = Some(Entry {
            migrate: migrate_component::<C>,
            drop: drop_component::<C>,
        });
    }

    /// Returns whether callbacks exist for the given id.
    pub fn is_registered(&self, id: component::Id) -> bool {
        self.entries
            .get(id.index())
            .is_some_and(|entry| entry.is_some())
    }

    /// Gets the migrate callback for a component id.
    ///
    /// # Panics
    ///
    /// Panics if no callbacks were registered for `id`.
    pub fn migrate_fn(&self, id: component::Id) -> MigrateFn {
        self.entry(id).migrate
    }

    /// Gets the drop callback for a component id.
    ///
    /// # Panics
    ///
    /// Panics if no callbacks were registered for `id`.
    pub fn drop_fn(&self, id: component::Id) -> DropFn {
        self.entry(id).drop
    }

    fn entry(&self, id: component::Id) -> Entry {
        self.entries
            .get(id.index())
            .copied()
            .flatten()
            .unwrap_or_else(|| panic!("no callbacks registered for component id {:?}", id))
    }
}

/// Monomorphized migrate: take the value from the source pool, move it into
/// the destination pool. The value itself is moved, never cloned or dropped.
fn migrate_component<C: Component>(
    id: component::Id,
    entity: Handle,
    source: &mut Archetype,
    destination: &mut Archetype,
) {
    let value = source.take::<C>(id, entity).unwrap_or_else(|| {
        panic!(
            "migrate: entity {:?} has no value for component id {:?} in archetype {:?}",
            entity,
            id,
            source.id()
        )
    });
    destination.add::<C>(id, entity, value);
}

/// Monomorphized drop: remove the value from the pool and let it fall out of
/// scope, running its destructor.
fn drop_component<C: Component>(id: component::Id, entity: Handle, archetype: &mut Archetype) {
    let _ = archetype.take::<C>(id, entity);
}
