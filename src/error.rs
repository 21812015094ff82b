//! Recoverable error types.
//!
//! Only data-level failures are represented here: asking about an entity
//! that no longer exists, or a component type the target archetype does not
//! store. Structural misuse (out-of-range indices, unknown archetype ids,
//! unknown chunk group hashes) is a caller bug and panics instead.

use thiserror::Error;

use crate::entity::Entity;

/// Result alias for fallible entity and component operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Recoverable failure of an entity or component operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity was destroyed (or never created); its id may since have
    /// been recycled for a different entity.
    #[error("entity {0:?} does not exist or has already been destroyed")]
    StaleEntity(Entity),

    /// The component type is not part of the target archetype's schema.
    #[error("component `{component}` is not part of the target archetype")]
    MissingComponent {
        /// Name of the missing component type.
        component: &'static str,
    },
}
