//! Chunk-based archetype storage core for entity-component systems.
//!
//! Entities of one archetype (one component set) live together in a
//! [`ChunkGroup`]: fixed-capacity struct-of-arrays chunks, partitioned by an
//! opaque [`ChunkGroupHash`] so that entities sharing a key stay physically
//! adjacent. Rows are left-packed per partition; removal swap-fills from the
//! end and reports which entity moved, so every entity is addressable by a
//! dense `(hash, index)` pair. The [`EntityManager`] owns entity identity
//! and locations on top of that storage.
//!
//! Components are plain-old-data ([`bytemuck::Pod`]): fresh rows are
//! zero-filled, not default-constructed, and rows relocate by bitwise copy.
//! Read access goes through typed views ([`ChunkView`], [`GroupView`],
//! [`StorageView`]) that borrow the storage, so stale-view bugs are compile
//! errors rather than runtime ones.
//!
//! The crate is single-threaded by design; callers provide their own
//! synchronization around a manager or group.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archetype;
pub mod chunk;
pub mod chunk_group;
pub mod entity;
pub mod error;
pub mod manager;
pub mod types;
pub mod view;

// ---- storage layer ----
pub use chunk::Chunk;
pub use chunk_group::{ChunkGroup, EntityMoveResult, EntityMoved};

// ---- identity and metadata ----
pub use entity::{Entity, EntityAllocator};
pub use types::{
    ArchetypeId, ChunkGroupHash, Component, ComponentMask, ComponentTypeInfo, EntityId,
};

// ---- archetypes and lifecycle ----
pub use archetype::ComponentGroup;
pub use error::{EcsError, EcsResult};
pub use manager::{ComponentValues, EntityLocation, EntityManager};

// ---- views ----
pub use view::{ChunkView, Fetch, GroupView, Read, StorageView};

/// Convenience re-exports for glob import.
pub mod prelude {
    pub use crate::archetype::ComponentGroup;
    pub use crate::chunk_group::ChunkGroup;
    pub use crate::entity::Entity;
    pub use crate::error::{EcsError, EcsResult};
    pub use crate::manager::EntityManager;
    pub use crate::types::{ArchetypeId, ChunkGroupHash, Component, ComponentTypeInfo};
    pub use crate::view::{Fetch, Read};
}
