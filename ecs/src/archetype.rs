//! Archetypes: co-located storage for entities with identical signatures.
//!
//! Every unique [`Signature`] seen at runtime gets exactly one [`Archetype`],
//! created on demand and owned by the [`Archetypes`] arena. An archetype
//! holds one [`ComponentPool`] per set bit in its signature plus the ordered
//! list of member entities. Entities move between archetypes when their
//! composition changes; the manager drives that movement through the
//! type-erased callbacks in [`crate::component::Callbacks`].

use std::collections::HashMap;

use log::debug;

use crate::component::{self, Component};
use crate::entity::Handle;
use crate::pool::{ComponentPool, PoolOps};
use crate::signature::Signature;

/// An archetype identifier: the index of the archetype in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Creates a new archetype id from the given value.
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

/// One storage grouping: the pools and member list for a single signature.
pub struct Archetype {
    id: Id,
    signature: Signature,
    pools: HashMap<component::Id, Box<dyn PoolOps>>,
    entities: Vec<Handle>,
}

impl Archetype {
    pub(crate) fn new(id: Id, signature: Signature) -> Self {
        Self {
            id,
            signature,
            pools: HashMap::new(),
            entities: Vec::new(),
        }
    }

    /// This archetype's id in the arena.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// The signature this archetype stores.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The member entities, oldest first.
    #[inline]
    pub fn entities(&self) -> &[Handle] {
        &self.entities
    }

    /// Returns whether the entity is a member of this archetype.
    pub fn contains_entity(&self, entity: Handle) -> bool {
        self.entities.contains(&entity)
    }

    /// Records an entity as a member. Idempotent: an entity already present
    /// is not duplicated.
    pub(crate) fn add_entity(&mut self, entity: Handle) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    /// Records a known-new entity as a member without the membership scan.
    /// Used on the spawn path, where the handle was just drawn from the free
    /// pool and cannot already be present.
    pub(crate) fn push_entity(&mut self, entity: Handle) {
        self.entities.push(entity);
    }

    /// Removes an entity from the member list, preserving the order of the
    /// remaining members. Returns whether the entity was present.
    pub(crate) fn remove_entity(&mut self, entity: Handle) -> bool {
        match self.entities.iter().position(|member| *member == entity) {
            Some(index) => {
                self.entities.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns whether the entity holds a value in the pool for `id`.
    /// Answers `false` when no such pool exists yet.
    pub fn contains(&self, id: component::Id, entity: Handle) -> bool {
        self.pools.get(&id).is_some_and(|pool| pool.contains(entity))
    }

    /// The entities with values in the pool for `id`, in slot order. Empty
    /// when no such pool exists yet.
    pub fn pool_entities(&self, id: component::Id) -> &[Handle] {
        self.pools.get(&id).map_or(&[], |pool| pool.entities())
    }

    /// Gets a reference to the entity's value in the pool for `id`.
    ///
    /// # Panics
    ///
    /// Panics if this archetype has no pool for `id`, or if the pool's
    /// element type is not `C`.
    pub fn get<C: Component>(&self, id: component::Id, entity: Handle) -> Option<&C> {
        self.pool::<C>(id).get(entity)
    }

    /// Gets a mutable reference to the entity's value in the pool for `id`.
    ///
    /// # Panics
    ///
    /// Panics if this archetype has no pool for `id`, or if the pool's
    /// element type is not `C`.
    pub fn get_mut<C: Component>(&mut self, id: component::Id, entity: Handle) -> Option<&mut C> {
        self.pool_mut::<C>(id).get_mut(entity)
    }

    /// Stores a value for an entity, creating the pool for `id` on first use.
    /// An existing value for the entity is overwritten in place.
    pub(crate) fn add<C: Component>(&mut self, id: component::Id, entity: Handle, value: C) {
        let pool = self
            .pools
            .entry(id)
            .or_insert_with(|| Box::new(ComponentPool::<C>::new()));
        pool.as_any_mut()
            .downcast_mut::<ComponentPool<C>>()
            .unwrap_or_else(|| {
                panic!(
                    "component pool type mismatch: pool for id {:?} does not store `{}`",
                    id,
                    std::any::type_name::<C>()
                )
            })
            .add(entity, value);
    }

    /// Removes and returns the entity's value from the pool for `id`.
    ///
    /// # Panics
    ///
    /// Panics if this archetype has no pool for `id`, or if the pool's
    /// element type is not `C`.
    pub(crate) fn take<C: Component>(&mut self, id: component::Id, entity: Handle) -> Option<C> {
        self.pool_mut::<C>(id).remove(entity)
    }

    fn pool<C: Component>(&self, id: component::Id) -> &ComponentPool<C> {
        self.pools
            .get(&id)
            .unwrap_or_else(|| {
                panic!(
                    "component pool missing: archetype {:?} has no pool for component id {:?}",
                    self.id, id
                )
            })
            .as_any()
            .downcast_ref::<ComponentPool<C>>()
            .unwrap_or_else(|| {
                panic!(
                    "component pool type mismatch: pool for id {:?} does not store `{}`",
                    id,
                    std::any::type_name::<C>()
                )
            })
    }

    fn pool_mut<C: Component>(&mut self, id: component::Id) -> &mut ComponentPool<C> {
        self.pools
            .get_mut(&id)
            .unwrap_or_else(|| {
                panic!(
                    "component pool missing: archetype {:?} has no pool for component id {:?}",
                    self.id, id
                )
            })
            .as_any_mut()
            .downcast_mut::<ComponentPool<C>>()
            .unwrap_or_else(|| {
                panic!(
                    "component pool type mismatch: pool for id {:?} does not store `{}`",
                    id,
                    std::any::type_name::<C>()
                )
            })
    }
}

/// Arena owning every archetype, keyed by signature.
#[derive(Default)]
pub struct Archetypes {
    archetypes: Vec<Archetype>,
    by_signature: HashMap<Signature, Id>,
}

impl Archetypes {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            archetypes: Vec::new(),
            by_signature: HashMap::new(),
        }
    }

    /// Gets the id of the archetype for a signature, creating the archetype
    /// if this signature has never been seen.
    pub(crate) fn get_or_create(&mut self, signature: &Signature) -> Id {
        if let Some(id) = self.by_signature.get(signature) {
            return *id;
        }
        let id = Id::new(self.archetypes.len() as u32);
        debug!("creating archetype {:?} for signature {}", id, signature);
        self.by_signature.insert(signature.clone(), id);
        self.archetypes.push(Archetype::new(id, signature.clone()));
        id
    }

    /// Gets the id of the archetype for a signature, if one exists.
    pub fn id_of(&self, signature: &Signature) -> Option<Id> {
        self.by_signature.get(signature).copied()
    }

    /// Gets the archetype with the given id.
    pub fn get(&self, id: Id) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    /// Gets a mutable reference to the archetype with the given id.
    pub(crate) fn get_mut(&mut self, id: Id) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.index())
    }

    /// Gets the archetype storing the given signature, if one exists.
    pub fn get_by_signature(&self, signature: &Signature) -> Option<&Archetype> {
        self.id_of(signature).and_then(|id| self.get(id))
    }

    pub(crate) fn get_by_signature_mut(&mut self, signature: &Signature) -> Option<&mut Archetype> {
        self.id_of(signature).and_then(|id| self.get_mut(id))
    }

    /// Gets mutable references to two distinct archetypes at once.
    ///
    /// # Panics
    ///
    /// Panics if `a == b` or either id is out of bounds.
    pub(crate) fn pair_mut(&mut self, a: Id, b: Id) -> (&mut Archetype, &mut Archetype) {
        assert_ne!(a, b, "pair_mut requires two distinct archetypes");
        if a.index() < b.index() {
            let (head, tail) = self.archetypes.split_at_mut(b.index());
            (&mut head[a.index()], &mut tail[0])
        } else {
            let (head, tail) = self.archetypes.split_at_mut(a.index());
            (&mut tail[0], &mut head[b.index()])
        }
    }

    /// Number of archetypes created so far.
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns whether no archetypes have been created.
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Iterates all archetypes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }
}
