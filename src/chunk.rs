//! Fixed-capacity struct-of-arrays chunks.
//!
//! A chunk owns one typed column per schema entry plus a trailing entity
//! column, all of the same fixed capacity. Occupied slots are left-packed.
//! The chunk itself never decides packing policy; its owning chunk group
//! drives `push`/`remove_and_compact` and keeps the dense-index invariant.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use crate::entity::Entity;
use crate::types::{Component, ComponentTypeInfo};

/// Type-erased column storage.
///
/// Invariant: every column of a chunk has the same capacity, and slot `i`
/// of all columns together forms one entity row.
pub(crate) trait Column: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Overwrites the slot with the type's all-zero value.
    fn zero_slot(&mut self, slot: usize);

    /// Copies the value at `src` over the value at `dst`.
    fn copy_within(&mut self, src: usize, dst: usize);

    /// Copies a value from the same-typed column of another chunk.
    fn copy_from(&mut self, dst: usize, src_column: &dyn Column, src_slot: usize);
}

pub(crate) struct TypedColumn<T: Component> {
    pub(crate) values: Box<[T]>,
}

impl<T: Component> TypedColumn<T> {
    /// Column constructor captured by [`ComponentTypeInfo::of`]. Values
    /// start zeroed.
    pub(crate) fn boxed(capacity: usize) -> Box<dyn Column> {
        Box::new(Self {
            values: vec![T::zeroed(); capacity].into_boxed_slice(),
        })
    }
}

impl<T: Component> Column for TypedColumn<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn zero_slot(&mut self, slot: usize) {
        self.values[slot] = T::zeroed();
    }

    #[inline]
    fn copy_within(&mut self, src: usize, dst: usize) {
        self.values[dst] = self.values[src];
    }

    fn copy_from(&mut self, dst: usize, src_column: &dyn Column, src_slot: usize) {
        let src = src_column
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .expect("column type mismatch");
        self.values[dst] = src.values[src_slot];
    }
}

/// Column table of an archetype: the user component types in canonical
/// (TypeId-sorted) order, followed by the implicit entity column.
pub(crate) struct Schema {
    infos: Box<[ComponentTypeInfo]>,
}

impl Schema {
    pub(crate) fn new(component_infos: &[ComponentTypeInfo]) -> Self {
        let mut infos = component_infos.to_vec();
        infos.sort_unstable_by_key(ComponentTypeInfo::type_id);
        for pair in infos.windows(2) {
            assert_ne!(
                pair[0].type_id(),
                pair[1].type_id(),
                "duplicate component type `{}` in schema",
                pair[1].name()
            );
        }
        assert!(
            !infos
                .iter()
                .any(|info| info.type_id() == TypeId::of::<Entity>()),
            "the entity column is implicit; do not list `Entity` as a component"
        );
        infos.push(ComponentTypeInfo::of::<Entity>());
        Self {
            infos: infos.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn column_of(&self, type_id: TypeId) -> Option<usize> {
        self.infos.iter().position(|info| info.type_id() == type_id)
    }

    #[inline]
    pub(crate) fn contains(&self, type_id: TypeId) -> bool {
        self.column_of(type_id).is_some()
    }

    #[inline]
    pub(crate) fn entity_column(&self) -> usize {
        self.infos.len() - 1
    }

    pub(crate) fn infos(&self) -> &[ComponentTypeInfo] {
        &self.infos
    }
}

/// One fixed-capacity struct-of-arrays block.
pub struct Chunk {
    schema: Arc<Schema>,
    columns: Box<[Box<dyn Column>]>,
    len: usize,
    capacity: usize,
}

impl Chunk {
    pub(crate) fn new(schema: Arc<Schema>, capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");
        let columns = schema
            .infos()
            .iter()
            .map(|info| info.new_column(capacity))
            .collect();
        Self {
            schema,
            columns,
            len: 0,
            capacity,
        }
    }

    /// Number of slots the chunk can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Appends a row for `entity`. All component values start zeroed, even
    /// when the slot was previously occupied. Requires spare capacity.
    pub(crate) fn push(&mut self, entity: Entity) -> usize {
        assert!(self.len < self.capacity, "chunk is full");
        let slot = self.len;
        for column in self.columns.iter_mut() {
            column.zero_slot(slot);
        }
        self.len += 1;
        let entity_column = self.schema.entity_column();
        self.write::<Entity>(entity_column, slot, entity);
        slot
    }

    /// Vacates `slot` by moving the last occupied row into it, and reports
    /// the entity that moved. Removing the last row moves nothing.
    pub(crate) fn remove_and_compact(&mut self, slot: usize) -> Option<Entity> {
        assert!(slot < self.len, "slot {slot} out of range (len {})", self.len);
        let last = self.len - 1;
        self.len = last;
        if slot == last {
            return None;
        }
        for column in self.columns.iter_mut() {
            column.copy_within(last, slot);
        }
        Some(self.read::<Entity>(self.schema.entity_column(), slot))
    }

    /// Discards the last occupied row. Used when the row has already been
    /// copied elsewhere.
    pub(crate) fn pop(&mut self) {
        assert!(self.len > 0, "pop on empty chunk");
        self.len -= 1;
    }

    /// Copies the full row (all columns) at `src_slot` of `src` over the
    /// row at `dst_slot`. Both chunks must share a schema.
    pub(crate) fn copy_row_from(&mut self, dst_slot: usize, src: &Chunk, src_slot: usize) {
        assert!(dst_slot < self.len && src_slot < src.len, "row copy out of range");
        for (dst_column, src_column) in self.columns.iter_mut().zip(src.columns.iter()) {
            dst_column.copy_from(dst_slot, src_column.as_ref(), src_slot);
        }
    }

    /// Entity stored at `slot`.
    pub fn entity(&self, slot: usize) -> Entity {
        assert!(slot < self.len, "slot {slot} out of range (len {})", self.len);
        self.read::<Entity>(self.schema.entity_column(), slot)
    }

    /// Component value at `slot`. Panics if `T` is not part of the schema.
    pub fn value<T: Component>(&self, slot: usize) -> T {
        assert!(slot < self.len, "slot {slot} out of range (len {})", self.len);
        self.read::<T>(self.column_of::<T>(), slot)
    }

    pub(crate) fn set_value<T: Component>(&mut self, slot: usize, value: T) {
        assert!(slot < self.len, "slot {slot} out of range (len {})", self.len);
        let column = self.column_of::<T>();
        self.write::<T>(column, slot, value);
    }

    /// Occupied part of the `T` column, or `None` if the schema lacks `T`.
    pub fn components<T: Component>(&self) -> Option<&[T]> {
        let column = self.schema.column_of(TypeId::of::<T>())?;
        let column = self.columns[column]
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .expect("column type mismatch");
        Some(&column.values[..self.len])
    }

    pub(crate) fn components_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        let index = self.schema.column_of(TypeId::of::<T>())?;
        let len = self.len;
        let column = self.columns[index]
            .as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
            .expect("column type mismatch");
        Some(&mut column.values[..len])
    }

    /// Simultaneous mutable access to two distinct columns.
    pub(crate) fn two_columns_mut<A: Component, B: Component>(
        &mut self,
    ) -> Option<(&mut [A], &mut [B])> {
        let a = self.schema.column_of(TypeId::of::<A>())?;
        let b = self.schema.column_of(TypeId::of::<B>())?;
        assert_ne!(a, b, "two_columns_mut requires distinct component types");
        let len = self.len;
        let (a_column, b_column) = if a < b {
            let (left, right) = self.columns.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.columns.split_at_mut(a);
            (&mut right[0], &mut left[b])
        };
        let a_values = a_column
            .as_any_mut()
            .downcast_mut::<TypedColumn<A>>()
            .expect("column type mismatch");
        let b_values = b_column
            .as_any_mut()
            .downcast_mut::<TypedColumn<B>>()
            .expect("column type mismatch");
        Some((&mut a_values.values[..len], &mut b_values.values[..len]))
    }

    fn column_of<T: Component>(&self) -> usize {
        self.schema
            .column_of(TypeId::of::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "component `{}` is not stored in this chunk",
                    type_name::<T>()
                )
            })
    }

    #[inline]
    fn read<T: Component>(&self, column: usize, slot: usize) -> T {
        self.columns[column]
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .expect("column type mismatch")
            .values[slot]
    }

    #[inline]
    fn write<T: Component>(&mut self, column: usize, slot: usize, value: T) {
        self.columns[column]
            .as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
            .expect("column type mismatch")
            .values[slot] = value;
    }
}
