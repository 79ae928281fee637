//! Entity/component storage core for the Prism renderer and editor.
//!
//! This crate implements the registry that lets heterogeneous, dynamically
//! typed bundles of data ("components") be attached to lightweight integer
//! handles ("entities"). Entities sharing the exact same component
//! composition are grouped into co-located storage blocks ("archetypes"),
//! giving O(1) amortized attach/detach/lookup and type-erased migration
//! between groupings as composition changes at runtime.
//!
//! # Architecture
//!
//! - [`component`]: the [`Component`] marker trait, stable per-type ids, and
//!   the migrate/drop callback table that lets the non-generic manager drive
//!   generically-typed pools.
//! - [`signature`]: fixed-width bit vector over component ids; the key that
//!   identifies an archetype.
//! - [`pool`]: dense per-type component storage with swap-and-pop removal.
//! - [`archetype`]: one storage grouping per unique signature, owned by a
//!   signature-keyed arena.
//! - [`manager`]: the state machine that computes signature deltas and moves
//!   entity data between archetypes.
//! - [`entity`]: the fixed-capacity handle roster, identity tokens, and the
//!   [`Entity`] facade consumed by the renderer.
//!
//! # Example
//!
//! ```
//! use prism_ecs::Roster;
//! use prism_macros::Component;
//!
//! #[derive(Component)]
//! struct Position { x: f32, y: f32, z: f32 }
//!
//! # fn main() -> Result<(), prism_ecs::Error> {
//! let mut roster = Roster::new();
//! roster.register_component::<Position>();
//!
//! let player = roster.create_entity("player")?;
//! roster.add_component(&player, Position { x: 0.0, y: 0.0, z: 0.0 })?;
//! assert_eq!(roster.get_component::<Position>(&player)?.x, 0.0);
//! # Ok(())
//! # }
//! ```

// Allow derives generated by `prism_macros` to reference `::prism_ecs` paths
// from within this crate.
extern crate self as prism_ecs;

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod manager;
pub mod pool;
pub mod signature;

/// Fixed capacity of the roster's entity handle pool.
pub const MAX_ENTITIES: usize = 50_000;

/// Fixed width of a [`Signature`]: the maximum number of distinct component
/// types a single registry supports.
pub const MAX_COMPONENTS: usize = 32;

pub use archetype::Archetype;
pub use component::Component;
pub use entity::{Entity, Handle, IdentityToken, Roster};
pub use error::Error;
pub use manager::ComponentManager;
pub use signature::Signature;
