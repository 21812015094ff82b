//! Entity lifecycle and location bookkeeping.
//!
//! The manager is the only owner of entity locations: storage layers below
//! it report relocations through return values and never call back up.
//! Archetype masks and component groups live in parallel arrays indexed by
//! [`ArchetypeId`], so query code can scan the masks and index straight
//! into the groups.

use std::any::type_name;

use crate::archetype::ComponentGroup;
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EcsError, EcsResult};
use crate::types::{ArchetypeId, ChunkGroupHash, Component, ComponentMask, ComponentTypeInfo};

/// Where an entity's row currently lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityLocation {
    /// Archetype the entity belongs to.
    pub archetype: ArchetypeId,
    /// Partition inside the archetype's chunk group.
    pub hash: ChunkGroupHash,
    /// Dense index inside the partition.
    pub index: usize,
}

/// Initial component values handed to entity creation.
///
/// Implemented for tuples of up to four components (and the unit tuple for
/// all-zero entities). Values for types outside the archetype's set fail
/// with [`EcsError::MissingComponent`].
pub trait ComponentValues {
    /// Writes the values into a freshly added, zero-initialized row.
    fn write(
        self,
        group: &mut ComponentGroup,
        hash: ChunkGroupHash,
        index: usize,
    ) -> EcsResult<()>;
}

impl ComponentValues for () {
    fn write(
        self,
        _group: &mut ComponentGroup,
        _hash: ChunkGroupHash,
        _index: usize,
    ) -> EcsResult<()> {
        Ok(())
    }
}

macro_rules! impl_component_values {
    ($($name:ident . $index:tt),+) => {
        impl<$($name: Component),+> ComponentValues for ($($name,)+) {
            fn write(
                self,
                group: &mut ComponentGroup,
                hash: ChunkGroupHash,
                index: usize,
            ) -> EcsResult<()> {
                $(group.set_component_value::<$name>(hash, index, self.$index)?;)+
                Ok(())
            }
        }
    };
}

impl_component_values!(A.0);
impl_component_values!(A.0, B.1);
impl_component_values!(A.0, B.1, C.2);
impl_component_values!(A.0, B.1, C.2, D.3);

/// Creates and destroys entities and routes component access to the right
/// archetype.
#[derive(Default)]
pub struct EntityManager {
    masks: Vec<ComponentMask>,
    groups: Vec<ComponentGroup>,
    /// Indexed by entity id. Stale ids keep their last location until the
    /// id is recycled; `alive` is authoritative.
    locations: Vec<EntityLocation>,
    alive: Vec<bool>,
    allocator: EntityAllocator,
}

impl EntityManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an archetype for the given component set and returns its
    /// id. Registering an identical set (in any order) returns the existing
    /// id; the original chunk capacity and default hash stay in effect.
    pub fn create_entity_type(
        &mut self,
        chunk_capacity: usize,
        component_infos: &[ComponentTypeInfo],
        default_hash: ChunkGroupHash,
    ) -> ArchetypeId {
        let mask = ComponentMask::new(component_infos);
        if let Some(existing) = self.masks.iter().position(|known| *known == mask) {
            log::debug!("component set already registered as archetype {existing}");
            return existing as ArchetypeId;
        }
        let id = self.groups.len();
        assert!(id <= ArchetypeId::MAX as usize, "archetype id space exhausted");
        log::debug!("registered archetype {id} with {} component types", mask.len());
        self.masks.push(mask);
        self.groups
            .push(ComponentGroup::new(component_infos, chunk_capacity, default_hash));
        id as ArchetypeId
    }

    /// Creates one entity in the archetype's default partition.
    pub fn create_entity<V: ComponentValues>(
        &mut self,
        archetype: ArchetypeId,
        values: V,
    ) -> EcsResult<Entity> {
        let hash = self.groups[archetype as usize].default_hash();
        self.create_entity_in(archetype, hash, values)
    }

    /// Creates one entity in a specific partition of the archetype.
    pub fn create_entity_in<V: ComponentValues>(
        &mut self,
        archetype: ArchetypeId,
        hash: ChunkGroupHash,
        values: V,
    ) -> EcsResult<Entity> {
        let entity = self.allocator.allocate();
        let slot = entity.0 as usize;
        if slot == self.locations.len() {
            self.locations.push(EntityLocation::default());
            self.alive.push(false);
        }

        let group = &mut self.groups[archetype as usize];
        let index = group.storage_mut().add_entity(entity, hash);
        if let Err(err) = values.write(group, hash, index) {
            // A rejected value set must not leave a half-created row behind.
            if let Some(moved) = group.storage_mut().remove_entity(hash, index) {
                self.locations[moved.entity.0 as usize].index = index;
            }
            self.allocator.free(entity);
            return Err(err);
        }

        self.locations[slot] = EntityLocation {
            archetype,
            hash,
            index,
        };
        self.alive[slot] = true;
        Ok(entity)
    }

    /// Creates `count` entities in the archetype's default partition, all
    /// starting from the same values.
    pub fn create_entities<V: ComponentValues + Clone>(
        &mut self,
        archetype: ArchetypeId,
        count: usize,
        values: V,
    ) -> EcsResult<Vec<Entity>> {
        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            entities.push(self.create_entity(archetype, values.clone())?);
        }
        Ok(entities)
    }

    /// Destroys an entity and recycles its id. The entity that swap-filled
    /// its row, if any, is redirected transparently.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        let location = self.location_of(entity)?;
        let group = &mut self.groups[location.archetype as usize];
        if let Some(moved) = group
            .storage_mut()
            .remove_entity(location.hash, location.index)
        {
            self.locations[moved.entity.0 as usize].index = location.index;
        }
        self.alive[entity.0 as usize] = false;
        self.allocator.free(entity);
        Ok(())
    }

    /// Whether the entity is currently alive.
    #[inline]
    pub fn exists(&self, entity: Entity) -> bool {
        self.alive.get(entity.0 as usize).copied().unwrap_or(false)
    }

    /// Whether the entity is alive and its archetype stores `T`.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.exists(entity)
            && self.masks[self.locations[entity.0 as usize].archetype as usize].contains::<T>()
    }

    /// Current location of an alive entity.
    pub fn get_location(&self, entity: Entity) -> EcsResult<EntityLocation> {
        self.location_of(entity)
    }

    /// Reads one component value of an alive entity.
    pub fn get_component_data<T: Component>(&self, entity: Entity) -> EcsResult<T> {
        let location = self.location_of(entity)?;
        self.groups[location.archetype as usize]
            .get_component_value::<T>(location.hash, location.index)
    }

    /// Overwrites one component value of an alive entity.
    pub fn set_component_data<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        let location = self.location_of(entity)?;
        self.groups[location.archetype as usize].set_component_value::<T>(
            location.hash,
            location.index,
            value,
        )
    }

    /// Archetype masks, parallel to [`Self::get_component_groups`].
    pub fn get_component_types_groups(&self) -> &[ComponentMask] {
        &self.masks
    }

    /// Registered archetypes, parallel to
    /// [`Self::get_component_types_groups`].
    pub fn get_component_groups(&self) -> &[ComponentGroup] {
        &self.groups
    }

    /// Mutable access to the registered archetypes.
    pub fn get_component_groups_mut(&mut self) -> &mut [ComponentGroup] {
        &mut self.groups
    }

    /// Sets the shared value of type `T` for one partition of an archetype.
    pub fn set_shared_component<T: Send + Sync + 'static>(
        &mut self,
        archetype: ArchetypeId,
        hash: ChunkGroupHash,
        value: T,
    ) {
        self.groups[archetype as usize].set_shared_component(hash, value);
    }

    /// Shared value of type `T` for the partition an entity lives in.
    pub fn get_shared_component<T: Send + Sync + 'static>(
        &self,
        entity: Entity,
    ) -> EcsResult<&T> {
        let location = self.location_of(entity)?;
        self.groups[location.archetype as usize]
            .get_shared_component::<T>(location.hash)
            .ok_or(EcsError::MissingComponent {
                component: type_name::<T>(),
            })
    }

    /// Moves an entity to another partition of its archetype, keeping all
    /// component values. Used when the entity's shared-component key
    /// changes. Moving to the current partition is a no-op.
    pub fn change_entity_chunk_group(
        &mut self,
        entity: Entity,
        new_hash: ChunkGroupHash,
    ) -> EcsResult<()> {
        let location = self.location_of(entity)?;
        if location.hash == new_hash {
            return Ok(());
        }
        let result = self.groups[location.archetype as usize]
            .storage_mut()
            .move_entity(location.hash, location.index, new_hash);
        if let Some(moved) = result.entity_moved_by_remove {
            self.locations[moved.entity.0 as usize].index = location.index;
        }
        let slot = entity.0 as usize;
        self.locations[slot].hash = new_hash;
        self.locations[slot].index = result.new_index;
        Ok(())
    }

    /// Number of entities currently alive.
    pub fn number_of_entities(&self) -> usize {
        self.allocator.allocated()
    }

    fn location_of(&self, entity: Entity) -> EcsResult<EntityLocation> {
        if !self.exists(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        Ok(self.locations[entity.0 as usize])
    }
}
