//! The component manager: signature bookkeeping and archetype migration.
//!
//! The manager owns the component registry, the migrate/drop callback table,
//! the per-entity signature map, and the archetype arena. Every composition
//! change runs the same way: compute the entity's new signature, then move it
//! from the archetype of the old signature to the archetype of the new one,
//! migrating the values for bits set in both and dropping the values for
//! bits only the old signature carries.

use std::any::type_name;
use std::collections::HashMap;

use log::warn;

use crate::archetype::{Archetype, Archetypes};
use crate::component::{self, Component};
use crate::entity::Handle;
use crate::error::Error;
use crate::signature::Signature;

pub struct ComponentManager {
    registry: component::Registry,
    callbacks: component::Callbacks,
    signatures: HashMap<Handle, Signature>,
    archetypes: Archetypes,
}

impl ComponentManager {
    /// Creates an empty manager with no component types registered.
    pub fn new() -> Self {
        Self {
            registry: component::Registry::new(),
            callbacks: component::Callbacks::new(),
            signatures: HashMap::new(),
            archetypes: Archetypes::new(),
        }
    }

    /// Registers a component type, assigning its id and installing its
    /// migrate/drop callbacks. Idempotent.
    ///
    /// Every component type must be registered before any entity uses it in
    /// [`Self::add_component`].
    ///
    /// # Panics
    ///
    /// Panics if this registration would exceed [`crate::MAX_COMPONENTS`]
    /// distinct types.
    pub fn register_component<C: Component>(&mut self) -> component::Id {
        let id = self.registry.register::<C>();
        self.callbacks.register::<C>(id);
        id
    }

    /// The component type registry.
    pub fn registry(&self) -> &component::Registry {
        &self.registry
    }

    /// The archetype arena.
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    /// Tracks a freshly created entity: an empty signature, housed in the
    /// empty archetype.
    pub(crate) fn spawn(&mut self, entity: Handle) {
        let empty = Signature::new();
        let id = self.archetypes.get_or_create(&empty);
        self.archetypes
            .get_mut(id)
            .expect("empty archetype just created")
            .push_entity(entity);
        self.signatures.insert(entity, empty);
    }

    /// Tears an entity down: drops every component value it carries, removes
    /// it from its archetype, and forgets its signature. Returns whether the
    /// manager was tracking the entity.
    pub(crate) fn despawn(&mut self, entity: Handle) -> bool {
        let Some(signature) = self.signatures.remove(&entity) else {
            warn!("attempted to despawn an untracked entity: {:?}", entity);
            return false;
        };
        let id = self
            .archetypes
            .id_of(&signature)
            .unwrap_or_else(|| panic!("live signature {} has no archetype", signature));
        let registered = self.registry.len();
        let archetype = self
            .archetypes
            .get_mut(id)
            .expect("archetype id resolved from the arena");
        for index in 0..registered {
            let component_id = component::Id::from(index);
            if signature.test(component_id) {
                (self.callbacks.drop_fn(component_id))(component_id, entity, archetype);
            }
        }
        archetype.remove_entity(entity);
        true
    }

    /// Attaches a component value to an entity.
    ///
    /// If the entity already carries a `C`, the value is overwritten in place
    /// and no migration happens. Otherwise the entity moves to the archetype
    /// of its widened signature, carrying its other component values along.
    ///
    /// # Panics
    ///
    /// Panics if `C` was never registered.
    pub fn add_component<C: Component>(&mut self, entity: Handle, value: C) {
        let component_id = self.registered_id_of::<C>();
        let old = self.signatures.entry(entity).or_default().clone();
        if old.test(component_id) {
            // Same signature, same archetype, same slot.
            self.archetypes
                .get_by_signature_mut(&old)
                .unwrap_or_else(|| panic!("live signature {} has no archetype", old))
                .add::<C>(component_id, entity, value);
            return;
        }
        let new = old.with(component_id);
        self.move_entity(&old, &new, entity);
        self.archetypes
            .get_by_signature_mut(&new)
            .expect("destination archetype created by the move")
            .add::<C>(component_id, entity, value);
        self.signatures.insert(entity, new);
    }

    /// Detaches a component value from an entity, dropping it. Returns
    /// whether the entity carried one. Removing an absent component, or one
    /// of an unregistered type, is a no-op.
    pub fn remove_component<C: Component>(&mut self, entity: Handle) -> bool {
        let Some(component_id) = self.registry.get_of::<C>() else {
            return false;
        };
        let Some(old) = self.signatures.get(&entity).cloned() else {
            return false;
        };
        if !old.test(component_id) {
            return false;
        }
        // The leaving bit's value is dropped inside the migration pass.
        let new = old.without(component_id);
        self.move_entity(&old, &new, entity);
        self.signatures.insert(entity, new);
        true
    }

    /// Returns whether the entity currently carries a `C`.
    pub fn has_component<C: Component>(&self, entity: Handle) -> bool {
        let Some(component_id) = self.registry.get_of::<C>() else {
            return false;
        };
        self.signatures
            .get(&entity)
            .is_some_and(|signature| signature.test(component_id))
    }

    /// Gets a reference to the entity's `C` value.
    pub fn get_component<C: Component>(&self, entity: Handle) -> Result<&C, Error> {
        let not_present = Error::ComponentNotPresent(entity, type_name::<C>());
        let Some(component_id) = self.registry.get_of::<C>() else {
            return Err(not_present);
        };
        let signature = self
            .signatures
            .get(&entity)
            .filter(|signature| signature.test(component_id))
            .ok_or(not_present)?;
        let archetype = self
            .archetypes
            .get_by_signature(signature)
            .unwrap_or_else(|| panic!("live signature {} has no archetype", signature));
        archetype.get::<C>(component_id, entity).ok_or_else(|| {
            panic!(
                "archetype {:?} is missing the value for live entity {:?}",
                archetype.id(),
                entity
            )
        })
    }

    /// Gets a mutable reference to the entity's `C` value.
    pub fn get_component_mut<C: Component>(&mut self, entity: Handle) -> Result<&mut C, Error> {
        let not_present = Error::ComponentNotPresent(entity, type_name::<C>());
        let Some(component_id) = self.registry.get_of::<C>() else {
            return Err(not_present);
        };
        let signature = self
            .signatures
            .get(&entity)
            .filter(|signature| signature.test(component_id))
            .ok_or(not_present)?
            .clone();
        let archetype = self
            .archetypes
            .get_by_signature_mut(&signature)
            .unwrap_or_else(|| panic!("live signature {} has no archetype", signature));
        let archetype_id = archetype.id();
        archetype.get_mut::<C>(component_id, entity).ok_or_else(|| {
            panic!(
                "archetype {:?} is missing the value for live entity {:?}",
                archetype_id, entity
            )
        })
    }

    /// The entity's current signature. Untracked entities report the empty
    /// signature.
    pub fn signature_of(&self, entity: Handle) -> Signature {
        self.signatures.get(&entity).cloned().unwrap_or_default()
    }

    /// The archetype storing the given signature, if any entity composition
    /// has produced it.
    pub fn archetype(&self, signature: &Signature) -> Option<&Archetype> {
        self.archetypes.get_by_signature(signature)
    }

    /// Moves an entity between the archetypes of two signatures. Bits set in
    /// both migrate their values; bits set only in `old` drop theirs; bits
    /// set only in `new` get their values from the caller afterwards.
    fn move_entity(&mut self, old: &Signature, new: &Signature, entity: Handle) {
        if old == new {
            return;
        }
        let source_id = self.archetypes.get_or_create(old);
        let destination_id = self.archetypes.get_or_create(new);
        let registered = self.registry.len();
        let (source, destination) = self.archetypes.pair_mut(source_id, destination_id);
        // Half-open over the registered ids: every set bit is visited
        // exactly once.
        for index in 0..registered {
            let component_id = component::Id::from(index);
            if old.test(component_id) {
                if new.test(component_id) {
                    (self.callbacks.migrate_fn(component_id))(
                        component_id,
                        entity,
                        source,
                        destination,
                    );
                } else {
                    (self.callbacks.drop_fn(component_id))(component_id, entity, source);
                }
            }
        }
        source.remove_entity(entity);
        destination.add_entity(entity);
    }

    fn registered_id_of<C: Component>(&self) -> component::Id {
        self.registry.get_of::<C>().unwrap_or_else(|| {
            panic!(
                "component type `{}` used before registration",
                type_name::<C>()
            )
        })
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use prism_macros::Component;

    use super::*;

    #[derive(Component, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Component, Debug, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Component)]
    struct DropProbe {
        drops: Arc<AtomicUsize>,
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handle(value: u32) -> Handle {
        Handle::from(value)
    }

    fn manager() -> ComponentManager {
        let mut manager = ComponentManager::new();
        manager.register_component::<Position>();
        manager.register_component::<Velocity>();
        manager
    }

    /// Asserts that exactly one archetype in the arena holds the entity, and
    /// that it is the archetype of the entity's signature.
    fn assert_single_home(manager: &ComponentManager, entity: Handle) {
        let signature = manager.signature_of(entity);
        let homes: Vec<_> = manager
            .archetypes()
            .iter()
            .filter(|archetype| archetype.contains_entity(entity))
            .collect();
        assert_eq!(homes.len(), 1);
        assert_eq!(homes[0].signature(), &signature);
    }

    #[test]
    fn fresh_entities_live_in_the_empty_archetype() {
        // Given a spawned entity with no components
        let mut manager = manager();
        manager.spawn(handle(0));
        // Then its signature is empty and the empty archetype holds it
        assert!(manager.signature_of(handle(0)).is_empty());
        let empty = manager.archetype(&Signature::new()).unwrap();
        assert!(empty.contains_entity(handle(0)));
        assert_single_home(&manager, handle(0));
    }

    #[test]
    fn first_component_moves_out_of_the_empty_archetype() {
        let mut manager = manager();
        manager.spawn(handle(0));
        // When a component is attached
        manager.add_component(handle(0), Position { x: 1.0, y: 2.0, z: 3.0 });
        // Then the signature has the bit and exactly one archetype holds the
        // entity
        assert!(manager.has_component::<Position>(handle(0)));
        assert_eq!(manager.signature_of(handle(0)).count(), 1);
        assert_single_home(&manager, handle(0));
        assert_eq!(
            manager.get_component::<Position>(handle(0)).unwrap(),
            &Position { x: 1.0, y: 2.0, z: 3.0 }
        );
    }

    #[test]
    fn second_component_migrates_the_first_value() {
        let mut manager = manager();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Position { x: 1.0, y: 2.0, z: 3.0 });
        // When a second component widens the signature
        manager.add_component(handle(0), Velocity { x: 0.5, y: 0.0, z: 0.0 });
        // Then both values are readable from the new archetype
        assert_eq!(manager.signature_of(handle(0)).count(), 2);
        assert_single_home(&manager, handle(0));
        assert_eq!(
            manager.get_component::<Position>(handle(0)).unwrap(),
            &Position { x: 1.0, y: 2.0, z: 3.0 }
        );
        assert_eq!(
            manager.get_component::<Velocity>(handle(0)).unwrap(),
            &Velocity { x: 0.5, y: 0.0, z: 0.0 }
        );
    }

    #[test]
    fn re_adding_overwrites_without_migration() {
        let mut manager = manager();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Position { x: 1.0, y: 2.0, z: 3.0 });
        let archetypes_before = manager.archetypes().len();
        // When the same component type is attached again
        manager.add_component(handle(0), Position { x: 9.0, y: 9.0, z: 9.0 });
        // Then the value is replaced and no archetype was created
        assert_eq!(manager.archetypes().len(), archetypes_before);
        assert_eq!(
            manager.get_component::<Position>(handle(0)).unwrap(),
            &Position { x: 9.0, y: 9.0, z: 9.0 }
        );
        assert_single_home(&manager, handle(0));
    }

    #[test]
    fn removal_narrows_the_signature_and_drops_the_value() {
        let mut manager = manager();
        let drops = Arc::new(AtomicUsize::new(0));
        manager.register_component::<DropProbe>();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Position { x: 1.0, y: 2.0, z: 3.0 });
        manager.add_component(handle(0), DropProbe { drops: Arc::clone(&drops) });
        // When the probe is removed
        assert!(manager.remove_component::<DropProbe>(handle(0)));
        // Then its destructor ran once and the survivor migrated intact
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(!manager.has_component::<DropProbe>(handle(0)));
        assert_eq!(
            manager.get_component::<Position>(handle(0)).unwrap(),
            &Position { x: 1.0, y: 2.0, z: 3.0 }
        );
        assert_single_home(&manager, handle(0));
    }

    #[test]
    fn removing_an_absent_component_reports_false() {
        let mut manager = manager();
        manager.spawn(handle(0));
        assert!(!manager.remove_component::<Velocity>(handle(0)));
        // Removing twice reports false the second time
        manager.add_component(handle(0), Velocity { x: 0.0, y: 0.0, z: 0.0 });
        assert!(manager.remove_component::<Velocity>(handle(0)));
        assert!(!manager.remove_component::<Velocity>(handle(0)));
    }

    #[test]
    fn migration_never_double_drops() {
        let mut manager = manager();
        let drops = Arc::new(AtomicUsize::new(0));
        manager.register_component::<DropProbe>();
        manager.spawn(handle(0));
        manager.add_component(handle(0), DropProbe { drops: Arc::clone(&drops) });
        // When the probe rides two migrations
        manager.add_component(handle(0), Position { x: 0.0, y: 0.0, z: 0.0 });
        manager.add_component(handle(0), Velocity { x: 0.0, y: 0.0, z: 0.0 });
        // Then it was moved, not dropped
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert!(manager.has_component::<DropProbe>(handle(0)));
    }

    #[test]
    fn despawn_drops_every_component() {
        let mut manager = manager();
        let drops = Arc::new(AtomicUsize::new(0));
        manager.register_component::<DropProbe>();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Position { x: 0.0, y: 0.0, z: 0.0 });
        manager.add_component(handle(0), DropProbe { drops: Arc::clone(&drops) });
        // When the entity is despawned
        assert!(manager.despawn(handle(0)));
        // Then its values are dropped and no archetype holds it
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(manager
            .archetypes()
            .iter()
            .all(|archetype| !archetype.contains_entity(handle(0))));
        assert!(manager.signature_of(handle(0)).is_empty());
    }

    #[test]
    fn despawn_of_an_untracked_entity_reports_false() {
        let mut manager = manager();
        assert!(!manager.despawn(handle(42)));
    }

    #[test]
    fn get_of_a_missing_component_is_an_error() {
        let mut manager = manager();
        manager.spawn(handle(0));
        let error = manager.get_component::<Velocity>(handle(0)).unwrap_err();
        assert!(matches!(error, Error::ComponentNotPresent(entity, _) if entity == handle(0)));
    }

    #[test]
    fn get_mut_edits_the_stored_value() {
        let mut manager = manager();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Position { x: 1.0, y: 2.0, z: 3.0 });
        manager.get_component_mut::<Position>(handle(0)).unwrap().x = 7.0;
        assert_eq!(manager.get_component::<Position>(handle(0)).unwrap().x, 7.0);
    }

    #[test]
    #[should_panic(expected = "used before registration")]
    fn attaching_an_unregistered_type_panics() {
        struct Unregistered;
        impl Component for Unregistered {}
        let mut manager = manager();
        manager.spawn(handle(0));
        manager.add_component(handle(0), Unregistered);
    }

    #[test]
    fn siblings_are_unaffected_by_a_migration() {
        // Given two entities sharing an archetype
        let mut manager = manager();
        manager.spawn(handle(0));
        manager.spawn(handle(1));
        manager.add_component(handle(0), Position { x: 1.0, y: 0.0, z: 0.0 });
        manager.add_component(handle(1), Position { x: 2.0, y: 0.0, z: 0.0 });
        // When one of them migrates away
        manager.add_component(handle(0), Velocity { x: 0.0, y: 1.0, z: 0.0 });
        // Then the other keeps its value and its home
        assert_eq!(
            manager.get_component::<Position>(handle(1)).unwrap(),
            &Position { x: 2.0, y: 0.0, z: 0.0 }
        );
        assert_single_home(&manager, handle(0));
        assert_single_home(&manager, handle(1));
    }
}
