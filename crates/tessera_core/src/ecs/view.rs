//! # Views
//!
//! A view is a transient read/write path over one or more component pools
//! that visits every entity owning all of the requested components.
//!
//! ## Iteration Strategy
//!
//! Multi-type views drive iteration from the smallest pool: an entity missing
//! from the smallest pool cannot be in the intersection, so every other
//! candidate costs one membership probe per remaining pool.
//!
//! ```text
//! Position  (2 entities)  <- driver
//! Velocity  (5 entities)  <- probed with contains()
//! ```
//!
//! Single-type views skip the machinery and walk the contiguous component
//! array directly.
//!
//! ## Structural Changes
//!
//! A view holds exclusive borrows of its pools for its whole lifetime, so
//! inserting or removing components while iterating does not compile. Collect
//! the entities and apply changes after the pass.

use super::component::{Component, ComponentStorage, Storage};
use super::entity::Entity;
use super::registry::Registry;
use super::sparse_set::SparseStorage;
use super::type_id::{component_type_id, component_type_name};

/// A registry pool slot, indexed by component type id.
pub type PoolSlot = Option<Box<dyn ComponentStorage>>;

/// Return value of a [`for_each_cond`](View::for_each_cond) callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationDecision {
    /// Keep visiting entities.
    Continue,
    /// Stop immediately.
    Break,
}

/// A tuple of component types a view or group can be built over.
///
/// Implemented for tuples of one to four [`Component`] types.
pub trait ViewQuery {
    /// Exclusive borrows of each member pool, in tuple order.
    type Pools<'a>;

    /// Number of component types in the query.
    const ARITY: usize;

    /// Type ids of the members, in tuple order.
    fn type_ids() -> Vec<u64>;

    /// Creates any member pool the registry does not have yet.
    fn ensure_pools(registry: &mut Registry);

    /// Borrows every member pool out of the registry's slot table.
    ///
    /// # Panics
    ///
    /// Panics if a type is listed twice or a member pool does not exist.
    fn fetch(slots: &mut [PoolSlot]) -> Self::Pools<'_>;

    /// Tuple position of the pool with the fewest entities. Ties go to the
    /// earliest position.
    fn smallest(pools: &Self::Pools<'_>) -> usize;
}

/// Borrows `N` distinct pools out of `slots` at once.
pub(crate) fn fetch_disjoint<const N: usize>(
    slots: &mut [PoolSlot],
    ids: [u64; N],
) -> [&mut (dyn ComponentStorage + 'static); N] {
    for (i, id) in ids.iter().enumerate() {
        assert!(
            !ids[..i].contains(id),
            "component type {} listed twice in one query",
            component_type_name(*id).unwrap_or("<unknown>")
        );
    }

    let mut found: [Option<&mut (dyn ComponentStorage + 'static)>; N] = std::array::from_fn(|_| None);
    for (index, slot) in slots.iter_mut().enumerate() {
        if let Some(position) = ids.iter().position(|&id| id == index as u64) {
            found[position] = slot.as_deref_mut();
        }
    }

    let mut position = 0;
    found.map(|pool| {
        let id = ids[position];
        position += 1;
        pool.unwrap_or_else(|| {
            panic!(
                "no pool for component type {}",
                component_type_name(id).unwrap_or("<unknown>")
            )
        })
    })
}

/// Recovers the typed pool behind a type-erased one.
pub(crate) fn downcast_pool<'p, T: Component>(
    pool: &'p mut (dyn ComponentStorage + 'static),
) -> &'p mut T::Storage {
    let stored = pool.component_type_name();
    pool.as_any_mut()
        .downcast_mut::<T::Storage>()
        .unwrap_or_else(|| {
            panic!(
                "pool holds {stored}, expected {}",
                std::any::type_name::<T>()
            )
        })
}

/// Iteration over every entity owning all components of `Q`.
///
/// Built by [`Registry::view`], or directly over standalone pools with
/// [`View::new`]. The driving pool is chosen once, at construction.
pub struct View<'a, Q: ViewQuery> {
    pools: Q::Pools<'a>,
    driver: usize,
}

impl<'a, Q: ViewQuery> View<'a, Q> {
    /// Builds a view over borrowed pools.
    pub fn new(pools: Q::Pools<'a>) -> Self {
        let driver = Q::smallest(&pools);
        Self { pools, driver }
    }

    /// Tuple position of the pool driving iteration.
    #[inline]
    #[must_use]
    pub fn driver_index(&self) -> usize {
        self.driver
    }
}

impl<'a, A: Component> View<'a, (A,)> {
    /// Visits every component of the pool, in dense order.
    #[doc(alias = "run_system")]
    pub fn for_each(&mut self, mut f: impl FnMut(Entity, &mut A)) {
        let (entities, components) = self.pools.0.entities_and_components_mut();
        for (entity, component) in entities.iter().zip(components.iter_mut()) {
            f(*entity, component);
        }
    }

    /// Like [`for_each`](Self::for_each), stopping at the first
    /// [`IterationDecision::Break`].
    pub fn for_each_cond(&mut self, mut f: impl FnMut(Entity, &mut A) -> IterationDecision) {
        let (entities, components) = self.pools.0.entities_and_components_mut();
        for (entity, component) in entities.iter().zip(components.iter_mut()) {
            if f(*entity, component) == IterationDecision::Break {
                return;
            }
        }
    }

    /// Number of entities the view visits.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.0.len()
    }

    /// Checks whether the view visits nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.0.is_empty()
    }

    /// The underlying component array, in dense order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[A] {
        self.pools.0.components()
    }
}

macro_rules! impl_view_query {
    ($arity:literal; $($ty:ident $pool:ident @ $idx:tt),+) => {
        impl<$($ty: Component),+> ViewQuery for ($($ty,)+) {
            type Pools<'a> = ($(&'a mut <$ty as Component>::Storage,)+);

            const ARITY: usize = $arity;

            fn type_ids() -> Vec<u64> {
                vec![$(component_type_id::<$ty>()),+]
            }

            fn ensure_pools(registry: &mut Registry) {
                $(registry.get_or_create_pool::<$ty>();)+
            }

            fn fetch(slots: &mut [PoolSlot]) -> Self::Pools<'_> {
                let [$($pool),+] = fetch_disjoint(slots, [$(component_type_id::<$ty>()),+]);
                ($(downcast_pool::<$ty>($pool),)+)
            }

            fn smallest(pools: &Self::Pools<'_>) -> usize {
                let lens = [$(pools.$idx.len()),+];
                let mut best = 0;
                for (position, &len) in lens.iter().enumerate() {
                    if len < lens[best] {
                        best = position;
                    }
                }
                best
            }
        }
    };
}

macro_rules! impl_multi_view {
    ($($ty:ident $pool:ident),+) => {
        impl<'a, $($ty: Component),+> View<'a, ($($ty,)+)> {
            /// Visits every entity present in all pools, once each, in the
            /// driving pool's dense order.
            #[doc(alias = "run_system")]
            pub fn for_each(&mut self, mut f: impl FnMut(Entity, $(&mut $ty),+)) {
                self.for_each_cond(|entity, $($pool),+| {
                    f(entity, $($pool),+);
                    IterationDecision::Continue
                });
            }

            /// Like [`for_each`](Self::for_each), stopping at the first
            /// [`IterationDecision::Break`].
            pub fn for_each_cond(
                &mut self,
                mut f: impl FnMut(Entity, $(&mut $ty),+) -> IterationDecision,
            ) {
                let driver = self.driver;
                let ($($pool,)+) = &mut self.pools;
                let len = [$($pool.len()),+][driver];

                for index in 0..len {
                    let entity = [$($pool.dense()),+][driver][index];
                    if !($($pool.contains(entity))&&+) {
                        continue;
                    }
                    if f(entity, $($pool.get_mut(entity)),+) == IterationDecision::Break {
                        return;
                    }
                }
            }

            /// Upper bound on the number of entities visited: the size of
            /// the driving pool.
            #[must_use]
            pub fn size_hint(&self) -> usize {
                let ($($pool,)+) = &self.pools;
                [$($pool.len()),+][self.driver]
            }

            /// Collects the visited entities without touching components.
            #[must_use]
            pub fn entities(&self) -> Vec<Entity> {
                let ($($pool,)+) = &self.pools;
                let driver = [$($pool.dense()),+][self.driver];
                driver
                    .iter()
                    .copied()
                    .filter(|&entity| $($pool.contains(entity))&&+)
                    .collect()
            }
        }
    };
}

impl_view_query!(1; A a @ 0);
impl_view_query!(2; A a @ 0, B b @ 1);
impl_view_query!(3; A a @ 0, B b @ 1, C c @ 2);
impl_view_query!(4; A a @ 0, B b @ 1, C c @ 2, D d @ 3);

impl_multi_view!(A a, B b);
impl_multi_view!(A a, B b, C c);
impl_multi_view!(A a, B b, C c, D d);
