//! # Sparse Set
//!
//! The membership primitive every pool is built on:
//!
//! ```text
//! sparse: [ -, 1, -, 0, 2 ]     entity index -> dense position
//! dense:  [ e3, e1, e4 ]        packed, swap-compacted members
//! ```
//!
//! - Insert, remove and lookup are O(1)
//! - Removal swaps the last member into the hole, so dense order is not stable
//! - For every member `e`: `dense[sparse[e]] == e`

use super::entity::Entity;

/// Marker for an unused sparse slot.
const EMPTY: u32 = u32::MAX;

/// Set of entities with O(1) membership and a packed dense array.
///
/// Holds no component data. Pools embed a `SparseSet` and mirror every swap on
/// their own parallel arrays through the [`SparseStorage`] trait.
#[derive(Clone, Debug, Default)]
pub struct SparseSet {
    /// Entity index -> position in `dense`, or `EMPTY`.
    sparse: Vec<u32>,
    /// Present entities in insertion/swap order.
    dense: Vec<Entity>,
}

impl SparseSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` members before the dense
    /// array reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
        }
    }

    /// Adds `entity` at the end of the dense array.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is already present or is [`Entity::INVALID`].
    pub fn insert(&mut self, entity: Entity) {
        assert!(!entity.is_invalid(), "cannot insert Entity::INVALID");
        assert!(
            !self.contains(entity),
            "{entity} is already present in the sparse set"
        );

        let slot = entity.slot();
        if self.sparse.len() <= slot {
            self.sparse.resize(slot + 1, EMPTY);
        }

        self.sparse[slot] = self.dense.len() as u32;
        self.dense.push(entity);
    }

    /// Swap-removes `entity`, moving the last member into its slot.
    ///
    /// Returns the dense position the entity occupied.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    pub fn remove(&mut self, entity: Entity) -> usize {
        assert!(
            self.contains(entity),
            "{entity} is not present in the sparse set"
        );

        let index = self.sparse[entity.slot()] as usize;
        self.dense.swap_remove(index);

        // The former last member now lives at `index`
        if let Some(&moved) = self.dense.get(index) {
            self.sparse[moved.slot()] = index as u32;
        }
        self.sparse[entity.slot()] = EMPTY;

        index
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        for entity in &self.dense {
            self.sparse[entity.slot()] = EMPTY;
        }
        self.dense.clear();
    }

    /// Checks whether `entity` (index and generation) is a member.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        match self.sparse.get(entity.slot()) {
            Some(&position) if position != EMPTY => {
                self.dense.get(position as usize) == Some(&entity)
            }
            _ => false,
        }
    }

    /// Checks whether `entity` is a member stored before dense position `end`.
    #[inline]
    #[must_use]
    pub fn contains_before_index(&self, entity: Entity, end: usize) -> bool {
        self.contains(entity) && (self.sparse[entity.slot()] as usize) < end
    }

    /// Dense position of `entity`.
    ///
    /// Only meaningful while `contains(entity)` holds.
    #[inline]
    #[must_use]
    pub fn sparse_index(&self, entity: Entity) -> usize {
        debug_assert!(
            self.contains(entity),
            "{entity} is not present in the sparse set"
        );
        self.sparse[entity.slot()] as usize
    }

    /// Exchanges the members at dense positions `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of bounds.
    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        let (a, b) = (self.dense[i], self.dense[j]);
        self.sparse[a.slot()] = j as u32;
        self.sparse[b.slot()] = i as u32;
        self.dense.swap(i, j);
    }

    /// Present entities in dense order.
    #[inline]
    #[must_use]
    pub fn dense(&self) -> &[Entity] {
        &self.dense
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks whether the set has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterates over members in dense order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().copied()
    }
}

/// Shared contract of the sparse set and every pool built on it.
///
/// `swap`, `remove` and `clear` are the overridable operations: a pool must
/// apply the same permutation to its component array so that component `i`
/// always belongs to `dense()[i]`. Everything else is derived from them.
pub trait SparseStorage {
    /// The membership set backing this storage.
    fn sparse_set(&self) -> &SparseSet;

    /// Exchanges dense positions `i` and `j`, including parallel data.
    fn swap(&mut self, i: usize, j: usize);

    /// Swap-removes `entity` and its parallel data.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    fn remove(&mut self, entity: Entity);

    /// Removes every member and its parallel data.
    fn clear(&mut self);

    /// Checks whether `entity` is a member.
    #[inline]
    fn contains(&self, entity: Entity) -> bool {
        self.sparse_set().contains(entity)
    }

    /// Checks whether `entity` is a member stored before dense position `end`.
    #[inline]
    fn contains_before_index(&self, entity: Entity, end: usize) -> bool {
        self.sparse_set().contains_before_index(entity, end)
    }

    /// Dense position of `entity`. Requires `contains(entity)`.
    #[inline]
    fn sparse_index(&self, entity: Entity) -> usize {
        self.sparse_set().sparse_index(entity)
    }

    /// Present entities in dense order.
    #[inline]
    fn dense(&self) -> &[Entity] {
        self.sparse_set().dense()
    }

    /// Number of members.
    #[inline]
    fn len(&self) -> usize {
        self.sparse_set().len()
    }

    /// Checks whether there are no members.
    #[inline]
    fn is_empty(&self) -> bool {
        self.sparse_set().is_empty()
    }

    /// Moves `entity` to dense position `dest`.
    fn find_and_swap_to(&mut self, entity: Entity, dest: usize) {
        let src = self.sparse_index(entity);
        self.swap(src, dest);
    }

    /// Partitions the dense array so every entity failing `predicate` sits
    /// after every entity passing it.
    ///
    /// Returns the number of passing entities, which is also the position of
    /// the first failing one. Relative order inside either partition is not
    /// preserved.
    fn swap_back_all(&mut self, predicate: &mut dyn FnMut(Entity) -> bool) -> usize {
        let mut front = 0;
        let mut back = self.len();

        while front < back {
            if predicate(self.dense()[front]) {
                front += 1;
                continue;
            }

            // Find the last passing entity to trade places with
            back -= 1;
            while back > front && !predicate(self.dense()[back]) {
                back -= 1;
            }
            if back == front {
                break;
            }

            self.swap(front, back);
            front += 1;
        }

        front
    }

    /// Reorders the first `count` dense entries to follow `other`'s order.
    ///
    /// Used to index-align two pools over a shared prefix.
    ///
    /// # Panics
    ///
    /// Panics if one of `other`'s first `count` entities is missing here.
    fn swap_to_match(&mut self, other: &SparseSet, count: usize) {
        let count = count.min(self.len()).min(other.len());

        for i in 0..count {
            let wanted = other.dense()[i];
            if self.dense()[i] != wanted {
                assert!(
                    self.contains(wanted),
                    "{wanted} cannot be matched: missing from this storage"
                );
                let src = self.sparse_index(wanted);
                self.swap(i, src);
            }
        }
    }
}

impl SparseStorage for SparseSet {
    #[inline]
    fn sparse_set(&self) -> &SparseSet {
        self
    }

    #[inline]
    fn swap(&mut self, i: usize, j: usize) {
        SparseSet::swap(self, i, j);
    }

    #[inline]
    fn remove(&mut self, entity: Entity) {
        SparseSet::remove(self, entity);
    }

    #[inline]
    fn clear(&mut self) {
        SparseSet::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn e(index: u32) -> Entity {
        Entity::from(index)
    }

    fn assert_consistent(set: &SparseSet) {
        for (i, entity) in set.dense().iter().enumerate() {
            assert!(set.contains(*entity));
            assert_eq!(set.sparse_index(*entity), i);
        }
    }

    #[test]
    fn test_insert_remove_scenario() {
        let mut set = SparseSet::new();
        set.insert(e(1));
        set.insert(e(2));
        set.insert(e(3));
        assert_eq!(set.dense(), &[e(1), e(2), e(3)]);

        set.remove(e(2));
        assert_eq!(set.dense(), &[e(1), e(3)]);
        assert!(!set.contains(e(2)));
        assert!(set.contains(e(3)));
        assert_eq!(set.sparse_index(e(3)), 1);
        assert_consistent(&set);
    }

    #[test]
    fn test_remove_last() {
        let mut set = SparseSet::new();
        set.insert(e(4));
        set.insert(e(9));

        assert_eq!(set.remove(e(9)), 1);
        assert_eq!(set.dense(), &[e(4)]);
        assert_eq!(set.remove(e(4)), 0);
        assert!(set.is_empty());
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn test_double_insert_panics() {
        let mut set = SparseSet::new();
        set.insert(e(5));
        set.insert(e(5));
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn test_double_remove_panics() {
        let mut set = SparseSet::new();
        set.insert(e(5));
        set.remove(e(5));
        set.remove(e(5));
    }

    #[test]
    fn test_generation_mismatch_is_not_member() {
        let mut set = SparseSet::new();
        set.insert(Entity::new(3, 0));
        assert!(!set.contains(Entity::new(3, 1)));
        assert!(!set.contains(Entity::INVALID));
    }

    #[test]
    fn test_contains_before_index() {
        let mut set = SparseSet::new();
        for i in 0..4 {
            set.insert(e(i));
        }
        assert!(set.contains_before_index(e(1), 2));
        assert!(!set.contains_before_index(e(2), 2));
        assert!(!set.contains_before_index(e(10), 4));
    }

    #[test]
    fn test_clear() {
        let mut set = SparseSet::new();
        for i in 0..10 {
            set.insert(e(i));
        }
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(e(3)));

        set.insert(e(3));
        assert_eq!(set.sparse_index(e(3)), 0);
    }

    #[test]
    fn test_double_swap_restores_order() {
        let mut set = SparseSet::new();
        for i in 0..5 {
            set.insert(e(i * 2));
        }
        let before = set.dense().to_vec();

        set.swap(1, 3);
        assert_ne!(set.dense(), before.as_slice());
        assert_consistent(&set);

        set.swap(1, 3);
        assert_eq!(set.dense(), before.as_slice());
        assert_consistent(&set);
    }

    #[test]
    fn test_swap_back_all_partitions() {
        let mut set = SparseSet::new();
        for i in 0..10 {
            set.insert(e(i));
        }

        let passing = set.swap_back_all(&mut |entity| entity.index() % 3 == 0);
        assert_eq!(passing, 4);
        for (i, entity) in set.dense().iter().enumerate() {
            assert_eq!(entity.index() % 3 == 0, i < passing);
        }
        assert_consistent(&set);
    }

    #[test]
    fn test_swap_back_all_edges() {
        let mut set = SparseSet::new();
        assert_eq!(set.swap_back_all(&mut |_| true), 0);

        for i in 0..3 {
            set.insert(e(i));
        }
        assert_eq!(set.swap_back_all(&mut |_| true), 3);
        assert_eq!(set.swap_back_all(&mut |_| false), 0);
    }

    #[test]
    fn test_swap_to_match() {
        let mut reference = SparseSet::new();
        let mut other = SparseSet::new();
        for i in [5, 2, 8, 1] {
            reference.insert(e(i));
        }
        for i in [1, 9, 8, 2, 5] {
            other.insert(e(i));
        }

        other.swap_to_match(&reference, 4);
        assert_eq!(&other.dense()[..4], reference.dense());
        assert_eq!(other.dense()[4], e(9));
        assert_consistent(&other);
    }

    #[test]
    fn test_find_and_swap_to() {
        let mut set = SparseSet::new();
        for i in 0..4 {
            set.insert(e(i));
        }
        set.find_and_swap_to(e(3), 0);
        assert_eq!(set.dense()[0], e(3));
        assert_eq!(set.dense()[3], e(0));
        assert_consistent(&set);
    }

    #[test]
    fn test_random_sequences_match_model() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let mut set = SparseSet::new();
        let mut model = [false; 64];

        for _ in 0..10_000 {
            let index = rng.gen_range(0..64u32);
            let entity = e(index);
            if model[index as usize] {
                set.remove(entity);
                model[index as usize] = false;
            } else {
                set.insert(entity);
                model[index as usize] = true;
            }

            if rng.gen_bool(0.05) {
                let len = set.len();
                if len > 1 {
                    set.swap(rng.gen_range(0..len), rng.gen_range(0..len));
                }
            }
        }

        for (index, present) in model.iter().enumerate() {
            assert_eq!(set.contains(e(index as u32)), *present);
        }
        assert_eq!(set.len(), model.iter().filter(|p| **p).count());
        assert_consistent(&set);
    }
}
