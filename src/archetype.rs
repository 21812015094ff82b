//! Archetypes: one component set, one chunk group, optional shared values.

use std::any::{type_name, Any, TypeId};

use rustc_hash::FxHashMap;

use crate::chunk_group::ChunkGroup;
use crate::error::{EcsError, EcsResult};
use crate::types::{ChunkGroupHash, Component, ComponentMask, ComponentTypeInfo};
use crate::view::{ChunkView, Read};

/// Storage and metadata for one registered component set.
///
/// Owns the chunked storage for every entity of the archetype plus the
/// shared-component values: at most one value per `(shared type, partition
/// hash)`, never one per entity. Entities created without an explicit hash
/// land in the archetype's default partition.
pub struct ComponentGroup {
    mask: ComponentMask,
    storage: ChunkGroup,
    default_hash: ChunkGroupHash,
    shared: FxHashMap<(TypeId, ChunkGroupHash), Box<dyn Any + Send + Sync>>,
}

impl ComponentGroup {
    /// Creates an empty archetype for the given component set.
    pub fn new(
        component_infos: &[ComponentTypeInfo],
        chunk_capacity: usize,
        default_hash: ChunkGroupHash,
    ) -> Self {
        Self {
            mask: ComponentMask::new(component_infos),
            storage: ChunkGroup::new(component_infos, chunk_capacity),
            default_hash,
            shared: FxHashMap::default(),
        }
    }

    /// The archetype's component set.
    #[inline]
    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Partition used when no hash is given at entity creation.
    #[inline]
    pub fn default_hash(&self) -> ChunkGroupHash {
        self.default_hash
    }

    /// Number of entities stored, across all partitions.
    pub fn size(&self) -> usize {
        self.storage.total_number_of_entities()
    }

    /// Number of chunks held, retained empties included.
    pub fn num_chunks(&self) -> usize {
        self.storage.number_of_chunks()
    }

    /// Read view over the `T` column of one chunk, by group-global chunk
    /// index. Out of range yields an empty view.
    pub fn components<T: Component>(&self, chunk_index: usize) -> ChunkView<'_, Read<T>> {
        match self.storage.get_chunk(chunk_index) {
            Some(chunk) => ChunkView::new(chunk),
            None => ChunkView::empty(),
        }
    }

    /// The underlying chunk storage.
    #[inline]
    pub fn storage(&self) -> &ChunkGroup {
        &self.storage
    }

    /// Mutable access to the underlying chunk storage.
    #[inline]
    pub fn storage_mut(&mut self) -> &mut ChunkGroup {
        &mut self.storage
    }

    /// Component value at `(hash, index)`, failing on a type outside the
    /// archetype's set.
    pub fn get_component_value<T: Component>(
        &self,
        hash: ChunkGroupHash,
        index: usize,
    ) -> EcsResult<T> {
        if !self.mask.contains::<T>() {
            return Err(EcsError::MissingComponent {
                component: type_name::<T>(),
            });
        }
        Ok(self.storage.get_component_value::<T>(hash, index))
    }

    /// Overwrites the component value at `(hash, index)`, failing on a type
    /// outside the archetype's set.
    pub fn set_component_value<T: Component>(
        &mut self,
        hash: ChunkGroupHash,
        index: usize,
        value: T,
    ) -> EcsResult<()> {
        if !self.mask.contains::<T>() {
            return Err(EcsError::MissingComponent {
                component: type_name::<T>(),
            });
        }
        self.storage.set_component_value::<T>(hash, index, value);
        Ok(())
    }

    /// Sets the shared value of type `T` for one partition, replacing any
    /// previous value.
    pub fn set_shared_component<T: Send + Sync + 'static>(
        &mut self,
        hash: ChunkGroupHash,
        value: T,
    ) {
        self.shared.insert((TypeId::of::<T>(), hash), Box::new(value));
    }

    /// Shared value of type `T` for one partition, if set.
    pub fn get_shared_component<T: Send + Sync + 'static>(
        &self,
        hash: ChunkGroupHash,
    ) -> Option<&T> {
        self.shared
            .get(&(TypeId::of::<T>(), hash))
            .and_then(|value| value.downcast_ref::<T>())
    }
}
