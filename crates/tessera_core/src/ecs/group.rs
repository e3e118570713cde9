//! # Owning Groups
//!
//! A group keeps every entity that owns all of its component types packed
//! into the front of each member pool, in the same order everywhere:
//!
//! ```text
//!             |<- len ->|
//! Position:   [ e7 e2 e9 | e4 e1 ]
//! Velocity:   [ e7 e2 e9 | e3 ]
//! ```
//!
//! Iterating a group is therefore a straight index walk with no membership
//! probes. The cost moves to structural changes: the registry notifies every
//! group that owns the changed type, and the group swaps the entity into or
//! out of its prefix.
//!
//! Groups that share a component type must nest, one type set containing the
//! other. Notifications run smaller-first on add and larger-first on remove,
//! which keeps every nested prefix inside the prefixes of the groups around it.

use std::cmp::Ordering;

use super::component::{Component, ComponentStorage, Storage};
use super::entity::Entity;
use super::sparse_set::SparseStorage;
use super::view::{IterationDecision, PoolSlot, ViewQuery};

fn member(slots: &[PoolSlot], id: u64) -> &dyn ComponentStorage {
    slots
        .get(id as usize)
        .and_then(Option::as_deref)
        .unwrap_or_else(|| panic!("group member pool {id} is missing"))
}

fn member_mut(slots: &mut [PoolSlot], id: u64) -> &mut (dyn ComponentStorage + 'static) {
    slots
        .get_mut(id as usize)
        .and_then(Option::as_deref_mut)
        .unwrap_or_else(|| panic!("group member pool {id} is missing"))
}

/// Type-erased bookkeeping for one owning group.
#[derive(Debug)]
pub(crate) struct Group {
    /// Member type ids, sorted.
    type_ids: Vec<u64>,
    /// Length of the aligned prefix.
    len: usize,
}

impl Group {
    /// Creates a group over `type_ids` (sorted, distinct, at least two) and
    /// packs the current members into the prefix.
    ///
    /// `nested` must be set when another group shares a type; the packing
    /// then preserves the prefixes of the existing groups.
    pub(crate) fn build(type_ids: Vec<u64>, slots: &mut [PoolSlot], nested: bool) -> Self {
        debug_assert!(type_ids.windows(2).all(|pair| pair[0] < pair[1]));

        let mut group = Self { type_ids, len: 0 };
        if nested {
            group.pack_incrementally(slots);
        } else {
            group.pack_by_partition(slots);
        }
        group
    }

    /// Partitions the smallest member, then aligns the others to it.
    fn pack_by_partition(&mut self, slots: &mut [PoolSlot]) {
        let mut pools: Vec<Box<dyn ComponentStorage>> = self
            .type_ids
            .iter()
            .map(|&id| {
                slots[id as usize]
                    .take()
                    .unwrap_or_else(|| panic!("group member pool {id} is missing"))
            })
            .collect();

        let smallest = (0..pools.len())
            .min_by_key(|&i| pools[i].len())
            .unwrap_or_default();
        pools.swap(0, smallest);

        let (driver, others) = pools.split_at_mut(1);
        let driver = &mut driver[0];
        self.len = driver.swap_back_all(&mut |entity| others.iter().all(|pool| pool.contains(entity)));
        for pool in others.iter_mut() {
            pool.swap_to_match(driver.sparse_set(), self.len);
        }

        for pool in pools {
            let id = pool.component_type_id() as usize;
            slots[id] = Some(pool);
        }
    }

    /// Walks the smallest member and swaps each full member into the prefix.
    fn pack_incrementally(&mut self, slots: &mut [PoolSlot]) {
        let driver = self
            .type_ids
            .iter()
            .copied()
            .min_by_key(|&id| member(slots, id).len())
            .unwrap_or_default();

        let count = member(slots, driver).len();
        for index in 0..count {
            let entity = member(slots, driver).dense()[index];
            self.on_entity_added(entity, slots);
        }
    }

    pub(crate) fn type_ids(&self) -> &[u64] {
        &self.type_ids
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Checks whether `id` is a member type.
    pub(crate) fn owns(&self, id: u64) -> bool {
        self.type_ids.binary_search(&id).is_ok()
    }

    /// Checks whether any member type is also in `other` (sorted).
    pub(crate) fn shares_types(&self, other: &[u64]) -> bool {
        other.iter().any(|&id| self.owns(id))
    }

    /// Checks whether one type set contains the other.
    pub(crate) fn nests_with(&self, other: &[u64]) -> bool {
        let contains_all = |outer: &[u64], inner: &[u64]| {
            inner.iter().all(|id| outer.binary_search(id).is_ok())
        };
        contains_all(&self.type_ids, other) || contains_all(other, &self.type_ids)
    }

    /// Pulls `entity` into the prefix if it now owns every member type.
    pub(crate) fn on_entity_added(&mut self, entity: Entity, slots: &mut [PoolSlot]) {
        let complete = self
            .type_ids
            .iter()
            .all(|&id| member(slots, id).contains(entity));
        if !complete || member(slots, self.type_ids[0]).contains_before_index(entity, self.len) {
            return;
        }

        for &id in &self.type_ids {
            member_mut(slots, id).find_and_swap_to(entity, self.len);
        }
        self.len += 1;
    }

    /// Pushes `entity` out of the prefix before one of its components goes.
    pub(crate) fn on_entity_removed(&mut self, entity: Entity, slots: &mut [PoolSlot]) {
        if !member(slots, self.type_ids[0]).contains_before_index(entity, self.len) {
            return;
        }

        self.len -= 1;
        for &id in &self.type_ids {
            member_mut(slots, id).find_and_swap_to(entity, self.len);
        }
    }

    /// A member pool was emptied.
    pub(crate) fn on_pool_cleared(&mut self) {
        self.len = 0;
    }
}

/// Iteration over an owning group, built by [`Registry::group`](crate::Registry::group).
///
/// Component `i` of every member pool belongs to the same entity for
/// `i < len()`, so no membership checks are needed.
pub struct GroupView<'a, Q: ViewQuery> {
    pools: Q::Pools<'a>,
    len: usize,
    /// Another group shares a member type.
    nested: bool,
}

impl<'a, Q: ViewQuery> GroupView<'a, Q> {
    pub(crate) fn new(pools: Q::Pools<'a>, len: usize, nested: bool) -> Self {
        Self { pools, len, nested }
    }

    /// Number of entities in the group.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the group is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

macro_rules! impl_group_view {
    ($fty:ident $fpool:ident $(, $ty:ident $pool:ident)+) => {
        impl<'a, $fty: Component, $($ty: Component),+> GroupView<'a, ($fty, $($ty,)+)> {
            /// Visits every entity of the group in prefix order.
            #[doc(alias = "run_system")]
            pub fn for_each(&mut self, mut f: impl FnMut(Entity, &mut $fty, $(&mut $ty),+)) {
                self.for_each_cond(|entity, $fpool, $($pool),+| {
                    f(entity, $fpool, $($pool),+);
                    IterationDecision::Continue
                });
            }

            /// Like [`for_each`](Self::for_each), stopping at the first
            /// [`IterationDecision::Break`].
            pub fn for_each_cond(
                &mut self,
                mut f: impl FnMut(Entity, &mut $fty, $(&mut $ty),+) -> IterationDecision,
            ) {
                let len = self.len;
                let ($fpool, $($pool,)+) = &mut self.pools;
                for index in 0..len {
                    let entity = $fpool.dense()[index];
                    let decision = f(
                        entity,
                        $fpool.get_by_index_mut(index),
                        $($pool.get_by_index_mut(index)),+
                    );
                    if decision == IterationDecision::Break {
                        return;
                    }
                }
            }

            /// Entities of the group in prefix order.
            #[must_use]
            pub fn entities(&self) -> &[Entity] {
                &self.pools.0.dense()[..self.len]
            }

            /// Reorders the group by its first component, applying the same
            /// permutation to every member pool. Stable.
            ///
            /// # Panics
            ///
            /// Panics if another group shares a member type, since its
            /// prefix would be reordered in only some of its pools.
            pub fn sort_by(&mut self, mut compare: impl FnMut(&$fty, &$fty) -> Ordering) {
                assert!(
                    !self.nested,
                    "cannot sort a group that shares component types with another group"
                );

                let len = self.len;
                let ($fpool, $($pool,)+) = &mut self.pools;
                for i in 1..len {
                    let mut j = i;
                    while j > 0
                        && compare($fpool.get_by_index(j), $fpool.get_by_index(j - 1)) == Ordering::Less
                    {
                        SparseStorage::swap(&mut **$fpool, j, j - 1);
                        $(SparseStorage::swap(&mut **$pool, j, j - 1);)+
                        j -= 1;
                    }
                }
            }
        }
    };
}

impl_group_view!(A a, B b);
impl_group_view!(A a, B b, C c);
impl_group_view!(A a, B b, C c, D d);
