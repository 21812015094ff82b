//! Core identifier types and component type descriptors.

use std::any::{type_name, TypeId};
use std::mem;

use bytemuck::Pod;

use crate::chunk::{Column, TypedColumn};

/// Raw integer backing an [`Entity`](crate::entity::Entity) handle.
pub type EntityId = u32;

/// Index of a registered archetype inside the entity manager.
pub type ArchetypeId = u16;

/// Opaque partition key inside an archetype's chunk group.
///
/// Entities sharing a hash are stored together; zero is the valid default
/// partition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct ChunkGroupHash(pub u64);

/// Marker trait for data stored in chunk columns.
///
/// Components are plain-old-data: fresh slots are zero-filled rather than
/// default-constructed, and rows move between slots by bitwise copy. The
/// blanket impl covers every `Pod` type.
pub trait Component: Pod + Send + Sync + 'static {}

impl<T> Component for T where T: Pod + Send + Sync + 'static {}

/// Runtime descriptor of a component type.
///
/// Captures everything a chunk group needs to build and address a column for
/// the type: identity, layout, and a monomorphized column constructor. A set
/// of these (order-insensitive) defines an archetype schema.
#[derive(Clone, Copy)]
pub struct ComponentTypeInfo {
    type_id: TypeId,
    name: &'static str,
    size: usize,
    align: usize,
    new_column: fn(usize) -> Box<dyn Column>,
}

impl ComponentTypeInfo {
    /// Builds the descriptor for component type `T`.
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            new_column: TypedColumn::<T>::boxed,
        }
    }

    /// Stable identity of the described type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name, for diagnostics only.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size of one value in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of one value in bytes.
    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    pub(crate) fn new_column(&self, capacity: usize) -> Box<dyn Column> {
        (self.new_column)(capacity)
    }
}

impl std::fmt::Debug for ComponentTypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentTypeInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .finish()
    }
}

/// Sorted set of component type ids identifying an archetype.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ComponentMask {
    type_ids: Box<[TypeId]>,
}

impl ComponentMask {
    /// Builds the mask for a component set. Duplicates collapse; the input
    /// order does not matter.
    pub fn new(infos: &[ComponentTypeInfo]) -> Self {
        let mut type_ids: Vec<TypeId> = infos.iter().map(|info| info.type_id()).collect();
        type_ids.sort_unstable();
        type_ids.dedup();
        Self {
            type_ids: type_ids.into_boxed_slice(),
        }
    }

    /// Whether component type `T` is part of the set.
    #[inline]
    pub fn contains<T: Component>(&self) -> bool {
        self.contains_type_id(TypeId::of::<T>())
    }

    /// Whether the given type id is part of the set.
    #[inline]
    pub fn contains_type_id(&self, type_id: TypeId) -> bool {
        self.type_ids.binary_search(&type_id).is_ok()
    }

    /// Whether every type in `other` is also in `self`.
    pub fn contains_all(&self, other: &ComponentMask) -> bool {
        other
            .type_ids
            .iter()
            .all(|id| self.contains_type_id(*id))
    }

    /// Number of component types in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_ids.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_order_insensitive() {
        let a = ComponentMask::new(&[
            ComponentTypeInfo::of::<u32>(),
            ComponentTypeInfo::of::<f32>(),
        ]);
        let b = ComponentMask::new(&[
            ComponentTypeInfo::of::<f32>(),
            ComponentTypeInfo::of::<u32>(),
        ]);
        assert_eq!(a, b);
        assert!(a.contains::<u32>());
        assert!(a.contains::<f32>());
        assert!(!a.contains::<u64>());
    }

    #[test]
    fn mask_containment() {
        let big = ComponentMask::new(&[
            ComponentTypeInfo::of::<u32>(),
            ComponentTypeInfo::of::<f32>(),
            ComponentTypeInfo::of::<i64>(),
        ]);
        let small = ComponentMask::new(&[ComponentTypeInfo::of::<i64>()]);
        assert!(big.contains_all(&small));
        assert!(!small.contains_all(&big));
    }
}
