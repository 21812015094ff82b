//! Entity handles and id allocation.

use bytemuck::{Pod, Zeroable};

use crate::types::EntityId;

/// Opaque handle to a stored entity.
///
/// Carries no generation counter: after the manager destroys an entity the
/// integer may be handed out again for a new one. `Entity` is `Pod` because
/// chunks store it in a real column next to the component columns.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Pod, Zeroable)]
pub struct Entity(pub EntityId);

/// Free-list id allocator.
///
/// Fresh ids are monotonically increasing; freed ids are recycled in LIFO
/// order. The allocator does not track aliveness, the manager owns that.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    free: Vec<EntityId>,
    next: EntityId,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next id, preferring recycled ones.
    pub fn allocate(&mut self) -> Entity {
        if let Some(id) = self.free.pop() {
            return Entity(id);
        }
        let id = self.next;
        self.next += 1;
        Entity(id)
    }

    /// Returns an id to the free list. Freeing an id twice, or one that was
    /// never allocated, is a caller error.
    pub fn free(&mut self, entity: Entity) {
        debug_assert!(entity.0 < self.next, "freed entity was never allocated");
        self.free.push(entity.0);
    }

    /// Number of ids currently handed out.
    pub fn allocated(&self) -> usize {
        self.next as usize - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_zero() {
        let mut allocator = EntityAllocator::new();
        assert_eq!(allocator.allocate(), Entity(0));
        assert_eq!(allocator.allocate(), Entity(1));
        assert_eq!(allocator.allocate(), Entity(2));
        assert_eq!(allocator.allocated(), 3);
    }

    #[test]
    fn freed_ids_are_recycled() {
        let mut allocator = EntityAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        allocator.free(a);
        allocator.free(b);
        assert_eq!(allocator.allocated(), 0);

        let mut recycled = vec![allocator.allocate().0, allocator.allocate().0];
        recycled.sort_unstable();
        assert_eq!(recycled, vec![a.0, b.0]);

        // Free list exhausted, fresh ids continue past the high-water mark.
        assert_eq!(allocator.allocate(), Entity(2));
    }
}
