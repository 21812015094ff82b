//! Read views over chunk storage.
//!
//! A view is a borrow of column slices at one of three granularities: a
//! single chunk, one partition of a chunk group, or the whole group. Views
//! never fail: out-of-range coordinates and component types outside the
//! schema both yield an empty view. Because a view borrows the storage,
//! any structural mutation (add, remove, move, shrink) invalidates it at
//! compile time.
//!
//! The [`Fetch`] parameter selects the columns: `Read<T>` for one column
//! (including `Read<Entity>` for the implicit entity column) and tuples of
//! fetches for zipped access.

use std::marker::PhantomData;

use crate::chunk::Chunk;
use crate::chunk_group::Bucket;
use crate::types::{ChunkGroupHash, Component};

/// Column selection for a view.
pub trait Fetch {
    /// Borrowed column slices of one chunk.
    type Slice<'a>: Copy;
    /// One row of the selection.
    type Item<'a>;

    /// Borrows the selection from a chunk; `None` if any column is missing.
    fn fetch(chunk: &Chunk) -> Option<Self::Slice<'_>>;

    /// Reads the row at `slot`. `slot` must be within the fetched length.
    fn get<'a>(slices: Self::Slice<'a>, slot: usize) -> Self::Item<'a>;
}

/// Fetches the `T` column read-only.
pub struct Read<T>(PhantomData<T>);

impl<T: Component> Fetch for Read<T> {
    type Slice<'a> = &'a [T];
    type Item<'a> = &'a T;

    fn fetch(chunk: &Chunk) -> Option<Self::Slice<'_>> {
        chunk.components::<T>()
    }

    #[inline]
    fn get<'a>(slices: Self::Slice<'a>, slot: usize) -> Self::Item<'a> {
        &slices[slot]
    }
}

macro_rules! tuple_fetch {
    ($($name:ident),+) => {
        impl<$($name: Fetch),+> Fetch for ($($name,)+) {
            type Slice<'a> = ($($name::Slice<'a>,)+);
            type Item<'a> = ($($name::Item<'a>,)+);

            #[allow(non_snake_case)]
            fn fetch(chunk: &Chunk) -> Option<Self::Slice<'_>> {
                $(let $name = $name::fetch(chunk)?;)+
                Some(($($name,)+))
            }

            #[allow(non_snake_case)]
            #[inline]
            fn get<'a>(slices: Self::Slice<'a>, slot: usize) -> Self::Item<'a> {
                let ($($name,)+) = slices;
                ($($name::get($name, slot),)+)
            }
        }
    };
}

tuple_fetch!(A);
tuple_fetch!(A, B);
tuple_fetch!(A, B, C);
tuple_fetch!(A, B, C, D);

/// View over the occupied rows of a single chunk.
pub struct ChunkView<'a, F: Fetch> {
    slices: Option<F::Slice<'a>>,
    len: usize,
}

impl<'a, F: Fetch> ChunkView<'a, F> {
    pub(crate) fn new(chunk: &'a Chunk) -> Self {
        match F::fetch(chunk) {
            Some(slices) => Self {
                slices: Some(slices),
                len: chunk.len(),
            },
            None => Self::empty(),
        }
    }

    /// A view over nothing.
    pub fn empty() -> Self {
        Self {
            slices: None,
            len: 0,
        }
    }

    /// Number of rows in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Row at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<F::Item<'a>> {
        if index >= self.len {
            return None;
        }
        self.slices.map(|slices| F::get(slices, index))
    }

    /// Iterates the rows in slot order. Restartable: each call starts over.
    pub fn iter(&self) -> ChunkViewIter<'a, F> {
        ChunkViewIter {
            view: *self,
            index: 0,
        }
    }
}

impl<'a, F: Fetch> Clone for ChunkView<'a, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F: Fetch> Copy for ChunkView<'a, F> {}

impl<'a, F: Fetch> IntoIterator for ChunkView<'a, F> {
    type Item = F::Item<'a>;
    type IntoIter = ChunkViewIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, F: Fetch> IntoIterator for &ChunkView<'a, F> {
    type Item = F::Item<'a>;
    type IntoIter = ChunkViewIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of a [`ChunkView`].
pub struct ChunkViewIter<'a, F: Fetch> {
    view: ChunkView<'a, F>,
    index: usize,
}

impl<'a, F: Fetch> Iterator for ChunkViewIter<'a, F> {
    type Item = F::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.view.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, F: Fetch> ExactSizeIterator for ChunkViewIter<'a, F> {}

/// View over one partition of a chunk group: a sequence of chunk views in
/// chunk order. Flattening walks the partition's dense index order.
pub struct GroupView<'a, F: Fetch> {
    chunks: &'a [Chunk],
    chunk_capacity: usize,
    _fetch: PhantomData<F>,
}

impl<'a, F: Fetch + 'a> GroupView<'a, F> {
    pub(crate) fn new(chunks: &'a [Chunk], chunk_capacity: usize) -> Self {
        Self {
            chunks,
            chunk_capacity,
            _fetch: PhantomData,
        }
    }

    /// A view over nothing.
    pub fn empty() -> Self {
        Self {
            chunks: &[],
            chunk_capacity: 1,
            _fetch: PhantomData,
        }
    }

    /// Total number of rows across the partition's chunks.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    /// Whether the partition holds no rows.
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(Chunk::is_empty)
    }

    /// Per-chunk views, retained empty chunks included (as empty views).
    pub fn chunk_views(&self) -> impl Iterator<Item = ChunkView<'a, F>> + 'a {
        self.chunks.iter().map(ChunkView::new)
    }

    /// Row at a partition-dense index, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<F::Item<'a>> {
        let chunk = self.chunks.get(index / self.chunk_capacity)?;
        let slot = index % self.chunk_capacity;
        if slot >= chunk.len() {
            return None;
        }
        F::fetch(chunk).map(|slices| F::get(slices, slot))
    }

    /// Iterates all rows in dense index order. Restartable.
    pub fn iter(&self) -> impl Iterator<Item = F::Item<'a>> + 'a {
        self.chunk_views().flat_map(|view| view.iter())
    }
}

impl<'a, F: Fetch> Clone for GroupView<'a, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F: Fetch> Copy for GroupView<'a, F> {}

/// View over every partition of a chunk group, in first-use order.
pub struct StorageView<'a, F: Fetch> {
    buckets: &'a [Bucket],
    chunk_capacity: usize,
    _fetch: PhantomData<F>,
}

impl<'a, F: Fetch + 'a> StorageView<'a, F> {
    pub(crate) fn new(buckets: &'a [Bucket], chunk_capacity: usize) -> Self {
        Self {
            buckets,
            chunk_capacity,
            _fetch: PhantomData,
        }
    }

    /// Total number of rows across every partition.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len).sum()
    }

    /// Whether the whole group holds no rows.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.len == 0)
    }

    /// Per-partition views, keyed by partition hash.
    pub fn group_views(&self) -> impl Iterator<Item = (ChunkGroupHash, GroupView<'a, F>)> + 'a {
        let chunk_capacity = self.chunk_capacity;
        self.buckets
            .iter()
            .map(move |bucket| (bucket.hash, GroupView::new(&bucket.chunks, chunk_capacity)))
    }

    /// Iterates every row exactly once, partitions in first-use order.
    /// Restartable.
    pub fn iter(&self) -> impl Iterator<Item = F::Item<'a>> + 'a {
        self.group_views().flat_map(|(_, view)| view.iter())
    }
}

impl<'a, F: Fetch> Clone for StorageView<'a, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F: Fetch> Copy for StorageView<'a, F> {}
