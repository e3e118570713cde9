//! # Component Pool
//!
//! Dense component storage layered on a [`SparseSet`]:
//!
//! ```text
//! dense:      [ e3, e1, e4 ]
//! components: [ c3, c1, c4 ]   <- index-aligned, contiguous
//! ```
//!
//! - Access is O(1) via the sparse index
//! - Iteration is a straight walk over a contiguous slice
//! - Every swap on the set is mirrored on the component array

use std::any::Any;

use super::component::{Component, ComponentStorage, PoolContext, Storage};
use super::entity::Entity;
use super::events::ComponentEvent;
use super::sparse_set::{SparseSet, SparseStorage};
use super::type_id::component_type_id;
use crate::error::EcsResult;

/// Standard storage for CPU-only components.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: ComponentPool<Health> = ComponentPool::new();
/// pool.insert(entity, Health(100));
/// pool.get_mut(entity).0 -= 10;
/// pool.remove(entity);
/// ```
pub struct ComponentPool<T> {
    /// Membership and dense entity order.
    set: SparseSet,
    /// Components, index-aligned with `set.dense()`.
    components: Vec<T>,
    added: ComponentEvent<T>,
    removed: ComponentEvent<T>,
}

impl<T: Send + 'static> ComponentPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            set: SparseSet::new(),
            components: Vec::new(),
            added: ComponentEvent::new(),
            removed: ComponentEvent::new(),
        }
    }

    /// Creates an empty pool with room for `capacity` components.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
            added: ComponentEvent::new(),
            removed: ComponentEvent::new(),
        }
    }

    /// Stores `component` for `entity` and returns it.
    ///
    /// Fires the added event after the value is in place.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a component in this pool.
    pub fn insert(&mut self, entity: Entity, component: T) -> &mut T {
        self.set.insert(entity);
        self.components.push(component);

        let index = self.components.len() - 1;
        self.added.fire(entity, &mut self.components[index]);
        &mut self.components[index]
    }

    /// Stores the value produced by `make` for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a component in this pool.
    pub fn emplace_with(&mut self, entity: Entity, make: impl FnOnce() -> T) -> &mut T {
        self.insert(entity, make())
    }

    /// Stores `T::default()` for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a component in this pool.
    pub fn emplace_default(&mut self, entity: Entity) -> &mut T
    where
        T: Default,
    {
        self.insert(entity, T::default())
    }

    /// Removes the component of `entity` and returns it.
    ///
    /// The removed event fires first, while the value is still in the pool.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no component in this pool.
    pub fn take(&mut self, entity: Entity) -> T {
        assert!(
            self.set.contains(entity),
            "{entity} has no {} component",
            std::any::type_name::<T>()
        );

        let index = self.set.sparse_index(entity);
        self.removed.fire(entity, &mut self.components[index]);

        let component = self.components.swap_remove(index);
        self.set.remove(entity);
        component
    }

    /// Moves `entity` to dense position `dest`.
    pub fn find_and_swap_to(&mut self, entity: Entity, dest: usize) {
        SparseStorage::find_and_swap_to(self, entity, dest);
    }

    /// Number of components the array holds before reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.components.capacity()
    }

    /// Last component in dense order, usually the one inserted most recently.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.components.last()
    }

    /// Iterates over `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.set.iter().zip(self.components.iter())
    }

    /// Iterates mutably over `(entity, component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.set.iter().zip(self.components.iter_mut())
    }
}

impl<T: Send + 'static> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ComponentPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentPool")
            .field("type", &std::any::type_name::<T>())
            .field("dense", &self.set.dense())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> SparseStorage for ComponentPool<T> {
    #[inline]
    fn sparse_set(&self) -> &SparseSet {
        &self.set
    }

    #[inline]
    fn swap(&mut self, i: usize, j: usize) {
        self.set.swap(i, j);
        self.components.swap(i, j);
    }

    fn remove(&mut self, entity: Entity) {
        drop(self.take(entity));
    }

    fn clear(&mut self) {
        if !self.removed.is_empty() {
            for (entity, component) in self.set.dense().iter().zip(self.components.iter_mut()) {
                self.removed.fire(*entity, component);
            }
        }

        self.set.clear();
        self.components.clear();
    }
}

impl<T: Send + 'static> ComponentStorage for ComponentPool<T> {
    fn component_type_id(&self) -> u64 {
        component_type_id::<T>()
    }

    fn component_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Component> Storage<T> for ComponentPool<T> {
    fn create(_context: &PoolContext) -> Self {
        Self::new()
    }

    fn emplace(&mut self, entity: Entity, component: T) -> EcsResult<&mut T> {
        Ok(self.insert(entity, component))
    }

    #[inline]
    fn components(&self) -> &[T] {
        &self.components
    }

    #[inline]
    fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    #[inline]
    fn entities_and_components_mut(&mut self) -> (&[Entity], &mut [T]) {
        (self.set.dense(), &mut self.components)
    }

    fn added_event(&mut self) -> &mut ComponentEvent<T> {
        &mut self.added
    }

    fn removed_event(&mut self) -> &mut ComponentEvent<T> {
        &mut self.removed
    }
}
