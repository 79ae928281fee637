//! Entity handles, identity tokens, and the roster.
//!
//! An entity is nothing more than a handle: a small integer drawn from a
//! fixed pool of [`crate::MAX_ENTITIES`] values. Handles are recycled, so
//! every roster slot also carries a random 128-bit identity token that is
//! reminted whenever the slot's occupant is destroyed. The [`Entity`] facade
//! handed to callers captures the token at creation time; the roster refuses
//! any operation whose facade no longer matches its slot, turning
//! use-after-destroy into a recoverable [`Error::StaleEntity`] instead of
//! silent corruption.

use std::fmt;

use crossbeam::queue::SegQueue;
use log::{info, warn};
use rand::Rng;

use crate::MAX_ENTITIES;
use crate::archetype::Archetype;
use crate::component::{self, Component};
use crate::error::Error;
use crate::manager::ComponentManager;
use crate::signature::Signature;

/// An entity handle: an index into the roster's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Creates a new handle from the given value.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Gets the handle value as a `usize` for indexing.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Handle {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// A random 128-bit identity token distinguishing successive occupants of a
/// recycled handle. Tokens use the version-4 UUID bit layout and display in
/// the usual hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityToken(u128);

impl IdentityToken {
    pub(crate) fn mint() -> Self {
        let mut bytes: [u8; 16] = rand::thread_rng().r#gen();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Self(u128::from_be_bytes(bytes))
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.0.to_be_bytes().iter().enumerate() {
            write!(f, "{byte:02x}")?;
            if matches!(index, 3 | 5 | 7 | 9) {
                write!(f, "-")?;
            }
        }
        Ok(())
    }
}

/// The caller-facing view of a live entity: its handle, the identity token
/// minted at creation, and a display name.
///
/// Facades are cheap to clone and safe to hold past the entity's death; the
/// roster validates the token on every use.
#[derive(Debug, Clone)]
pub struct Entity {
    handle: Handle,
    token: IdentityToken,
    name: String,
}

impl Entity {
    /// The entity's handle.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The identity token minted when this entity was created.
    #[inline]
    pub fn token(&self) -> IdentityToken {
        self.token
    }

    /// The display name given at creation.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct Slot {
    token: IdentityToken,
    alive: bool,
}

/// The entity roster: a fixed-capacity pool of handles plus the component
/// manager that tracks what each live entity carries.
pub struct Roster {
    slots: Vec<Slot>,
    free: SegQueue<Handle>,
    manager: ComponentManager,
}

impl Roster {
    /// Creates a roster with all [`MAX_ENTITIES`] handles free.
    pub fn new() -> Self {
        let free = SegQueue::new();
        let mut slots = Vec::with_capacity(MAX_ENTITIES);
        for index in 0..MAX_ENTITIES {
            free.push(Handle::new(index as u32));
            slots.push(Slot {
                token: IdentityToken::mint(),
                alive: false,
            });
        }
        Self {
            slots,
            free,
            manager: ComponentManager::new(),
        }
    }

    /// Registers a component type with the underlying manager. Every
    /// component type must be registered before entities use it.
    pub fn register_component<C: Component>(&mut self) -> component::Id {
        self.manager.register_component::<C>()
    }

    /// Read access to the underlying component manager, for archetype and
    /// registry queries.
    pub fn manager(&self) -> &ComponentManager {
        &self.manager
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        MAX_ENTITIES - self.free.len()
    }

    /// Creates a new entity with a fresh identity token and an empty
    /// component signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityOverflow`] when all handles are live.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Result<Entity, Error> {
        let Some(handle) = self.free.pop() else {
            return Err(Error::EntityOverflow(MAX_ENTITIES));
        };
        let token = IdentityToken::mint();
        let slot = &mut self.slots[handle.index()];
        slot.token = token;
        slot.alive = true;
        self.manager.spawn(handle);
        let entity = Entity {
            handle,
            token,
            name: name.into(),
        };
        info!("created entity {:?} ({})", entity.handle, entity.name);
        Ok(entity)
    }

    /// Destroys an entity: drops all of its component values, remints its
    /// slot's token so outstanding facades go stale, and returns its handle
    /// to the free pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEntity`] if the facade's token no longer
    /// matches; the current occupant of the handle is left untouched.
    pub fn destroy_entity(&mut self, entity: &Entity) -> Result<(), Error> {
        if !self.is_current(entity) {
            warn!(
                "attempted to destroy a stale entity {:?} ({})",
                entity.handle, entity.name
            );
            return Err(Error::StaleEntity(entity.handle));
        }
        self.manager.despawn(entity.handle);
        let slot = &mut self.slots[entity.handle.index()];
        slot.alive = false;
        slot.token = IdentityToken::mint();
        self.free.push(entity.handle);
        info!("destroyed entity {:?} ({})", entity.handle, entity.name);
        Ok(())
    }

    /// Attaches a component value to an entity. An existing value of the
    /// same type is overwritten in place.
    ///
    /// # Panics
    ///
    /// Panics if `C` was never registered.
    pub fn add_component<C: Component>(&mut self, entity: &Entity, value: C) -> Result<(), Error> {
        self.check(entity)?;
        self.manager.add_component(entity.handle, value);
        Ok(())
    }

    /// Detaches and drops an entity's component value. Returns whether the
    /// entity carried one.
    pub fn remove_component<C: Component>(&mut self, entity: &Entity) -> Result<bool, Error> {
        self.check(entity)?;
        Ok(self.manager.remove_component::<C>(entity.handle))
    }

    /// Returns whether the entity currently carries a `C`. Stale facades
    /// report `false`.
    pub fn has_component<C: Component>(&self, entity: &Entity) -> bool {
        self.is_current(entity) && self.manager.has_component::<C>(entity.handle)
    }

    /// Gets a reference to the entity's `C` value.
    pub fn get_component<C: Component>(&self, entity: &Entity) -> Result<&C, Error> {
        self.check(entity)?;
        self.manager.get_component(entity.handle)
    }

    /// Gets a mutable reference to the entity's `C` value.
    pub fn get_component_mut<C: Component>(&mut self, entity: &Entity) -> Result<&mut C, Error> {
        self.check(entity)?;
        self.manager.get_component_mut(entity.handle)
    }

    /// The entity's current component signature.
    pub fn entity_signature(&self, entity: &Entity) -> Result<Signature, Error> {
        self.check(entity)?;
        Ok(self.manager.signature_of(entity.handle))
    }

    /// The archetype storing the given signature, if any entity composition
    /// has produced it.
    pub fn archetype(&self, signature: &Signature) -> Option<&Archetype> {
        self.manager.archetype(signature)
    }

    /// Returns whether the facade still refers to the live occupant of its
    /// handle.
    pub fn is_current(&self, entity: &Entity) -> bool {
        let slot = &self.slots[entity.handle.index()];
        slot.alive && slot.token == entity.token
    }

    fn check(&self, entity: &Entity) -> Result<(), Error> {
        if self.is_current(entity) {
            Ok(())
        } else {
            Err(Error::StaleEntity(entity.handle))
        }
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
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

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.register_component::<Position>();
        roster.register_component::<Velocity>();
        roster
    }

    #[test]
    fn creates_entities_with_distinct_handles() {
        // Given a fresh roster
        let mut roster = roster();
        // When two entities are created
        let first = roster.create_entity("first").unwrap();
        let second = roster.create_entity("second").unwrap();
        // Then their handles and tokens differ
        assert_ne!(first.handle(), second.handle());
        assert_ne!(first.token(), second.token());
        assert_eq!(first.name(), "first");
        assert_eq!(roster.live_count(), 2);
    }

    #[test]
    fn fresh_entities_join_the_empty_archetype() {
        let mut roster = roster();
        let entity = roster.create_entity("fresh").unwrap();
        // Then the empty-signature archetype holds it from birth
        let empty = roster.archetype(&Signature::new()).unwrap();
        assert!(empty.contains_entity(entity.handle()));
        assert!(roster.entity_signature(&entity).unwrap().is_empty());
    }

    #[test]
    fn component_lifecycle_through_the_roster() {
        let mut roster = roster();
        let entity = roster.create_entity("mover").unwrap();
        // When components are attached
        roster
            .add_component(&entity, Position { x: 1.0, y: 2.0, z: 3.0 })
            .unwrap();
        roster
            .add_component(&entity, Velocity { x: 0.1, y: 0.0, z: 0.0 })
            .unwrap();
        // Then they are readable and the signature has both bits
        assert!(roster.has_component::<Position>(&entity));
        assert_eq!(roster.entity_signature(&entity).unwrap().count(), 2);
        roster.get_component_mut::<Position>(&entity).unwrap().x = 5.0;
        assert_eq!(roster.get_component::<Position>(&entity).unwrap().x, 5.0);
        // When one is removed
        assert!(roster.remove_component::<Velocity>(&entity).unwrap());
        assert!(!roster.has_component::<Velocity>(&entity));
        assert_eq!(
            roster.get_component::<Velocity>(&entity).unwrap_err(),
            Error::ComponentNotPresent(entity.handle(), std::any::type_name::<Velocity>())
        );
    }

    #[test]
    fn migrations_move_membership_between_archetypes() {
        let mut roster = roster();
        let entity = roster.create_entity("walker").unwrap();
        roster
            .add_component(&entity, Position { x: 0.0, y: 0.0, z: 0.0 })
            .unwrap();
        let position_only = roster.entity_signature(&entity).unwrap();
        // When the signature widens
        roster
            .add_component(&entity, Velocity { x: 1.0, y: 0.0, z: 0.0 })
            .unwrap();
        let both = roster.entity_signature(&entity).unwrap();
        // Then the entity sits in the wider archetype and has left the
        // narrower one
        assert!(roster
            .archetype(&both)
            .unwrap()
            .contains_entity(entity.handle()));
        assert!(!roster
            .archetype(&position_only)
            .unwrap()
            .contains_entity(entity.handle()));
        // When the original component is removed
        assert!(roster.remove_component::<Position>(&entity).unwrap());
        // Then the survivor migrated with its value intact
        assert_eq!(
            roster.entity_signature(&entity).unwrap().count(),
            1
        );
        assert_eq!(
            roster.get_component::<Velocity>(&entity).unwrap(),
            &Velocity { x: 1.0, y: 0.0, z: 0.0 }
        );
    }

    #[test]
    fn destroyed_entities_go_stale() {
        // Given a destroyed entity
        let mut roster = roster();
        let entity = roster.create_entity("doomed").unwrap();
        roster
            .add_component(&entity, Position { x: 0.0, y: 0.0, z: 0.0 })
            .unwrap();
        roster.destroy_entity(&entity).unwrap();
        // Then every operation through the old facade is rejected
        assert!(!roster.is_current(&entity));
        assert!(!roster.has_component::<Position>(&entity));
        assert_eq!(
            roster.get_component::<Position>(&entity).unwrap_err(),
            Error::StaleEntity(entity.handle())
        );
        assert_eq!(
            roster
                .add_component(&entity, Position { x: 1.0, y: 1.0, z: 1.0 })
                .unwrap_err(),
            Error::StaleEntity(entity.handle())
        );
        assert_eq!(
            roster.destroy_entity(&entity).unwrap_err(),
            Error::StaleEntity(entity.handle())
        );
    }

    #[test]
    fn a_recycled_handle_never_honors_the_old_facade() {
        // Given an entity destroyed and its handle reused
        let mut roster = roster();
        let old = roster.create_entity("old").unwrap();
        roster.destroy_entity(&old).unwrap();
        // Drain until the recycled handle comes back around
        let new = loop {
            let entity = roster.create_entity("new").unwrap();
            if entity.handle() == old.handle() {
                break entity;
            }
        };
        roster
            .add_component(&new, Position { x: 2.0, y: 0.0, z: 0.0 })
            .unwrap();
        // Then the old facade is stale while the new one works
        assert!(!roster.is_current(&old));
        assert!(roster.is_current(&new));
        assert_eq!(
            roster.destroy_entity(&old).unwrap_err(),
            Error::StaleEntity(old.handle())
        );
        assert_eq!(roster.get_component::<Position>(&new).unwrap().x, 2.0);
    }

    #[test]
    fn overflow_is_reported_and_destruction_recovers() {
        // Given a roster with every handle live
        let mut roster = roster();
        let mut entities = Vec::with_capacity(MAX_ENTITIES);
        for index in 0..MAX_ENTITIES {
            entities.push(roster.create_entity(format!("e{index}")).unwrap());
        }
        // Then one more creation overflows
        assert_eq!(
            roster.create_entity("overflow").unwrap_err(),
            Error::EntityOverflow(MAX_ENTITIES)
        );
        // When one entity is destroyed, creation succeeds again
        roster.destroy_entity(&entities[17]).unwrap();
        assert!(roster.create_entity("replacement").is_ok());
    }

    #[test]
    fn identity_tokens_display_hyphenated() {
        let token = IdentityToken::mint();
        let text = token.to_string();
        assert_eq!(text.len(), 36);
        for index in [8, 13, 18, 23] {
            assert_eq!(&text[index..=index], "-");
        }
        // Version and variant nibbles are fixed
        assert_eq!(&text[14..15], "4");
        assert!(matches!(&text[19..20], "8" | "9" | "a" | "b"));
    }
}
