//! Recoverable errors surfaced by the roster and component manager.
//!
//! Only conditions a caller can reasonably encounter and handle during normal
//! operation live here. Broken internal invariants (an archetype missing a
//! pool for a bit set in its own signature, callbacks looked up for an
//! unregistered component id, more distinct component types than
//! [`crate::MAX_COMPONENTS`]) indicate a mis-wired system and panic instead.

use thiserror::Error;

use crate::entity::Handle;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The roster's free-handle pool is exhausted.
    #[error("entity overflow: all {0} handles are live")]
    EntityOverflow(usize),

    /// A component lookup was issued for a type the entity does not carry.
    #[error("entity {0:?} does not carry a `{1}` component")]
    ComponentNotPresent(Handle, &'static str),

    /// An [`crate::Entity`] facade's identity token no longer matches the
    /// roster's slot for its handle. The entity it referred to has been
    /// destroyed, and the handle may already belong to a new occupant.
    #[error("stale entity: {0:?} has been destroyed or recycled")]
    StaleEntity(Handle),
}
