//! Hash-partitioned chunk storage with dense per-partition indices.
//!
//! A `ChunkGroup` holds every entity of one archetype, partitioned by
//! [`ChunkGroupHash`]. Each partition (bucket) is an ordered list of
//! fixed-capacity chunks; occupied rows are left-packed, so an entity's
//! dense index maps to `(index / capacity, index % capacity)`. Removal
//! swap-fills from the globally last occupied slot of the bucket and
//! reports which entity moved; chunks emptied by removals are retained
//! until [`ChunkGroup::shrink_to_fit`].

use std::any::{type_name, TypeId};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::chunk::{Chunk, Schema};
use crate::entity::Entity;
use crate::types::{ChunkGroupHash, Component, ComponentTypeInfo};
use crate::view::{ChunkView, Fetch, GroupView, StorageView};

/// Reported when a removal swap-filled the vacated index with another
/// entity; the owner of entity locations must redirect it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntityMoved {
    /// The entity now living at the removed entity's index.
    pub entity: Entity,
}

/// Outcome of [`ChunkGroup::move_entity`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntityMoveResult {
    /// Dense index of the moved entity inside its new partition.
    pub new_index: usize,
    /// Entity relocated inside the old partition by the implied removal.
    pub entity_moved_by_remove: Option<EntityMoved>,
}

pub(crate) struct Bucket {
    pub(crate) hash: ChunkGroupHash,
    pub(crate) chunks: Vec<Chunk>,
    /// Occupied rows. Chunks past `len / capacity` are retained empties.
    pub(crate) len: usize,
}

/// Chunked storage for one archetype.
pub struct ChunkGroup {
    schema: Arc<Schema>,
    chunk_capacity: usize,
    /// Buckets in first-use order; iteration order is stable across
    /// removals.
    buckets: Vec<Bucket>,
    bucket_index: FxHashMap<ChunkGroupHash, usize>,
}

impl ChunkGroup {
    /// Creates empty storage for the given component set.
    ///
    /// The entity column is implicit; `component_infos` must not list
    /// `Entity`, contain duplicates, and `chunk_capacity` must be non-zero.
    pub fn new(component_infos: &[ComponentTypeInfo], chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > 0, "chunk capacity must be non-zero");
        Self {
            schema: Arc::new(Schema::new(component_infos)),
            chunk_capacity,
            buckets: Vec::new(),
            bucket_index: FxHashMap::default(),
        }
    }

    /// Capacity of every chunk in this group.
    #[inline]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Whether the schema stores component type `T`. The implicit entity
    /// column counts, so `has_component::<Entity>()` is true.
    #[inline]
    pub fn has_component<T: Component>(&self) -> bool {
        self.has_component_type(TypeId::of::<T>())
    }

    /// Type-id form of [`Self::has_component`].
    #[inline]
    pub fn has_component_type(&self, type_id: TypeId) -> bool {
        self.schema.contains(type_id)
    }

    /// Appends a zero-initialized row for `entity` to the `hash` partition
    /// and returns its dense index. Creates the partition, and a chunk if
    /// the last occupied one is full and no retained empty follows it.
    pub fn add_entity(&mut self, entity: Entity, hash: ChunkGroupHash) -> usize {
        let bucket = self.ensure_bucket(hash);
        self.push_into(bucket, entity)
    }

    /// Removes the row at `index` in the `hash` partition. The globally
    /// last occupied row of the partition swap-fills the vacated index; the
    /// entity that moved (if any) is reported. Chunks left empty are
    /// retained.
    pub fn remove_entity(&mut self, hash: ChunkGroupHash, index: usize) -> Option<EntityMoved> {
        let bucket_index = self.bucket_position(hash);
        let capacity = self.chunk_capacity;
        let bucket = &mut self.buckets[bucket_index];
        assert!(
            index < bucket.len,
            "entity index {index} out of range (partition holds {})",
            bucket.len
        );
        let last = bucket.len - 1;
        bucket.len = last;
        if index == last {
            let moved = bucket.chunks[last / capacity].remove_and_compact(last % capacity);
            debug_assert!(moved.is_none());
            return None;
        }

        let (dst_chunk, dst_slot) = (index / capacity, index % capacity);
        let (src_chunk, src_slot) = (last / capacity, last % capacity);
        let moved = if dst_chunk == src_chunk {
            bucket.chunks[dst_chunk]
                .remove_and_compact(dst_slot)
                .expect("non-last removal must move a row")
        } else {
            let (left, right) = bucket.chunks.split_at_mut(src_chunk);
            let dst = &mut left[dst_chunk];
            let src = &mut right[0];
            dst.copy_row_from(dst_slot, src, src_slot);
            src.pop();
            dst.entity(dst_slot)
        };
        Some(EntityMoved { entity: moved })
    }

    /// Relocates the row at `index` from the `from` partition to the `to`
    /// partition, preserving all component values. The removal side behaves
    /// like [`Self::remove_entity`].
    pub fn move_entity(
        &mut self,
        from: ChunkGroupHash,
        index: usize,
        to: ChunkGroupHash,
    ) -> EntityMoveResult {
        assert_ne!(from, to, "move_entity requires distinct partitions");
        let from_bucket = self.bucket_position(from);
        let entity = self.get_entity(from, index);
        let to_bucket = self.ensure_bucket(to);
        let new_index = self.push_into(to_bucket, entity);

        let capacity = self.chunk_capacity;
        let (src_chunk, src_slot) = (index / capacity, index % capacity);
        let (dst_chunk, dst_slot) = (new_index / capacity, new_index % capacity);
        let (src_bucket, dst_bucket) = pair_mut(&mut self.buckets, from_bucket, to_bucket);
        dst_bucket.chunks[dst_chunk].copy_row_from(
            dst_slot,
            &src_bucket.chunks[src_chunk],
            src_slot,
        );

        let entity_moved_by_remove = self.remove_entity(from, index);
        EntityMoveResult {
            new_index,
            entity_moved_by_remove,
        }
    }

    /// Entity stored at `index` in the `hash` partition.
    pub fn get_entity(&self, hash: ChunkGroupHash, index: usize) -> Entity {
        let (chunk, slot) = self.locate(hash, index);
        chunk.entity(slot)
    }

    /// Component value at `index` in the `hash` partition. Panics if the
    /// schema lacks `T`; use [`Self::has_component`] to probe first.
    pub fn get_component_value<T: Component>(&self, hash: ChunkGroupHash, index: usize) -> T {
        let (chunk, slot) = self.locate(hash, index);
        chunk.value::<T>(slot)
    }

    /// Overwrites the component value at `index` in the `hash` partition.
    pub fn set_component_value<T: Component>(
        &mut self,
        hash: ChunkGroupHash,
        index: usize,
        value: T,
    ) {
        let (chunk, slot) = self.locate_mut(hash, index);
        chunk.set_value::<T>(slot, value);
    }

    /// Chunks held across all partitions, retained empties included.
    pub fn number_of_chunks(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.chunks.len()).sum()
    }

    /// Chunks held by the `hash` partition, or zero if it was never used.
    pub fn number_of_chunks_in(&self, hash: ChunkGroupHash) -> usize {
        self.bucket(hash).map_or(0, |bucket| bucket.chunks.len())
    }

    /// Entities stored in the `hash` partition, or zero if it was never
    /// used.
    pub fn number_of_entities(&self, hash: ChunkGroupHash) -> usize {
        self.bucket(hash).map_or(0, |bucket| bucket.len)
    }

    /// Entities stored across all partitions.
    pub fn total_number_of_entities(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len).sum()
    }

    /// Partition keys in first-use order.
    pub fn hashes(&self) -> impl Iterator<Item = ChunkGroupHash> + '_ {
        self.buckets.iter().map(|bucket| bucket.hash)
    }

    /// Releases the trailing empty chunks of the `hash` partition. Occupied
    /// chunks are never touched; unknown partitions are a no-op.
    pub fn shrink_to_fit(&mut self, hash: ChunkGroupHash) {
        let Some(&bucket_index) = self.bucket_index.get(&hash) else {
            return;
        };
        let capacity = self.chunk_capacity;
        let bucket = &mut self.buckets[bucket_index];
        let needed = (bucket.len + capacity - 1) / capacity;
        if bucket.chunks.len() > needed {
            log::trace!(
                "shrinking partition {:#x} from {} to {} chunks",
                bucket.hash.0,
                bucket.chunks.len(),
                needed
            );
            bucket.chunks.truncate(needed);
        }
    }

    /// View over one chunk of the `hash` partition. Any out-of-range
    /// `(hash, chunk_index)` yields an empty view, never an error.
    pub fn get_chunk_view<F: Fetch>(
        &self,
        hash: ChunkGroupHash,
        chunk_index: usize,
    ) -> ChunkView<'_, F> {
        match self
            .bucket(hash)
            .and_then(|bucket| bucket.chunks.get(chunk_index))
        {
            Some(chunk) => ChunkView::new(chunk),
            None => ChunkView::empty(),
        }
    }

    /// View over every chunk of the `hash` partition, in chunk order.
    /// Flattening it walks the partition's dense index order.
    pub fn get_group_view<'a, F: Fetch + 'a>(&'a self, hash: ChunkGroupHash) -> GroupView<'a, F> {
        match self.bucket(hash) {
            Some(bucket) => GroupView::new(&bucket.chunks, self.chunk_capacity),
            None => GroupView::empty(),
        }
    }

    /// View over every partition, in first-use order.
    pub fn get_view<'a, F: Fetch + 'a>(&'a self) -> StorageView<'a, F> {
        StorageView::new(&self.buckets, self.chunk_capacity)
    }

    /// Mutable access to the `T` column of one chunk. Out-of-range
    /// `(hash, chunk_index)` yields an empty slice; a `T` outside the
    /// schema panics.
    pub fn get_chunk_components_mut<T: Component>(
        &mut self,
        hash: ChunkGroupHash,
        chunk_index: usize,
    ) -> &mut [T] {
        let Some(&bucket_index) = self.bucket_index.get(&hash) else {
            return Default::default();
        };
        let Some(chunk) = self.buckets[bucket_index].chunks.get_mut(chunk_index) else {
            return Default::default();
        };
        chunk
            .components_mut::<T>()
            .unwrap_or_else(|| missing_component::<T>())
    }

    /// Mutable per-chunk `T` slices of the `hash` partition.
    pub fn group_components_mut<T: Component>(
        &mut self,
        hash: ChunkGroupHash,
    ) -> impl Iterator<Item = &mut [T]> + '_ {
        let chunks: &mut [Chunk] = match self.bucket_index.get(&hash) {
            Some(&bucket_index) => &mut self.buckets[bucket_index].chunks,
            None => Default::default(),
        };
        chunks.iter_mut().map(|chunk| {
            chunk
                .components_mut::<T>()
                .unwrap_or_else(|| missing_component::<T>())
        })
    }

    /// Mutable per-chunk `T` slices across all partitions, in first-use
    /// order.
    pub fn components_mut<T: Component>(&mut self) -> impl Iterator<Item = &mut [T]> + '_ {
        self.buckets
            .iter_mut()
            .flat_map(|bucket| bucket.chunks.iter_mut())
            .map(|chunk| {
                chunk
                    .components_mut::<T>()
                    .unwrap_or_else(|| missing_component::<T>())
            })
    }

    /// Mutable access to two distinct columns of one chunk, for zipped
    /// writes. Out-of-range coordinates yield empty slices.
    pub fn get_chunk_pair_mut<A: Component, B: Component>(
        &mut self,
        hash: ChunkGroupHash,
        chunk_index: usize,
    ) -> (&mut [A], &mut [B]) {
        let Some(&bucket_index) = self.bucket_index.get(&hash) else {
            return Default::default();
        };
        let Some(chunk) = self.buckets[bucket_index].chunks.get_mut(chunk_index) else {
            return Default::default();
        };
        chunk
            .two_columns_mut::<A, B>()
            .unwrap_or_else(|| missing_component::<A>())
    }

    /// Zipped mutable column pairs across all partitions.
    pub fn pairs_mut<A: Component, B: Component>(
        &mut self,
    ) -> impl Iterator<Item = (&mut [A], &mut [B])> + '_ {
        self.buckets
            .iter_mut()
            .flat_map(|bucket| bucket.chunks.iter_mut())
            .map(|chunk| {
                chunk
                    .two_columns_mut::<A, B>()
                    .unwrap_or_else(|| missing_component::<A>())
            })
    }

    /// Chunk at a group-global index (partitions in first-use order).
    pub(crate) fn get_chunk(&self, mut chunk_index: usize) -> Option<&Chunk> {
        for bucket in &self.buckets {
            if chunk_index < bucket.chunks.len() {
                return Some(&bucket.chunks[chunk_index]);
            }
            chunk_index -= bucket.chunks.len();
        }
        None
    }

    fn ensure_bucket(&mut self, hash: ChunkGroupHash) -> usize {
        if let Some(&bucket_index) = self.bucket_index.get(&hash) {
            return bucket_index;
        }
        let bucket_index = self.buckets.len();
        self.buckets.push(Bucket {
            hash,
            chunks: Vec::new(),
            len: 0,
        });
        self.bucket_index.insert(hash, bucket_index);
        bucket_index
    }

    fn push_into(&mut self, bucket_index: usize, entity: Entity) -> usize {
        let capacity = self.chunk_capacity;
        let index = self.buckets[bucket_index].len;
        let chunk_index = index / capacity;
        if chunk_index == self.buckets[bucket_index].chunks.len() {
            log::trace!(
                "allocating chunk {} for partition {:#x}",
                chunk_index,
                self.buckets[bucket_index].hash.0
            );
            let chunk = Chunk::new(Arc::clone(&self.schema), capacity);
            self.buckets[bucket_index].chunks.push(chunk);
        }
        let bucket = &mut self.buckets[bucket_index];
        let slot = bucket.chunks[chunk_index].push(entity);
        debug_assert_eq!(slot, index % capacity);
        bucket.len += 1;
        index
    }

    fn bucket(&self, hash: ChunkGroupHash) -> Option<&Bucket> {
        self.bucket_index
            .get(&hash)
            .map(|&bucket_index| &self.buckets[bucket_index])
    }

    fn bucket_position(&self, hash: ChunkGroupHash) -> usize {
        *self
            .bucket_index
            .get(&hash)
            .unwrap_or_else(|| panic!("unknown partition {:#x}", hash.0))
    }

    fn locate(&self, hash: ChunkGroupHash, index: usize) -> (&Chunk, usize) {
        let bucket = self
            .bucket(hash)
            .unwrap_or_else(|| panic!("unknown partition {:#x}", hash.0));
        assert!(
            index < bucket.len,
            "entity index {index} out of range (partition holds {})",
            bucket.len
        );
        (
            &bucket.chunks[index / self.chunk_capacity],
            index % self.chunk_capacity,
        )
    }

    fn locate_mut(&mut self, hash: ChunkGroupHash, index: usize) -> (&mut Chunk, usize) {
        let bucket_index = self.bucket_position(hash);
        let capacity = self.chunk_capacity;
        let bucket = &mut self.buckets[bucket_index];
        assert!(
            index < bucket.len,
            "entity index {index} out of range (partition holds {})",
            bucket.len
        );
        (&mut bucket.chunks[index / capacity], index % capacity)
    }
}

fn pair_mut(buckets: &mut [Bucket], a: usize, b: usize) -> (&mut Bucket, &mut Bucket) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = buckets.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = buckets.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn missing_component<T: Component>() -> ! {
    panic!(
        "component `{}` is not stored in this chunk group",
        type_name::<T>()
    )
}
