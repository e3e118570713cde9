//! # Registry
//!
//! The central container for entities and their component pools.
//!
//! - One pool per component type, created on first use and indexed by the
//!   component's type id
//! - Entity handles are recycled with a bumped generation
//! - Owning groups are kept consistent on every structural change

use super::component::{Component, ComponentStorage, PoolContext, Storage};
use super::entity::Entity;
use super::events::ComponentEvent;
use super::gpu::{share_allocator, HostBufferAllocator, SharedAllocator};
use super::group::{Group, GroupView};
use super::sparse_set::SparseStorage;
use super::type_id::{component_type_id, component_type_name};
use super::view::{downcast_pool, PoolSlot, View, ViewQuery};
use crate::config::EcsConfig;
use crate::error::EcsResult;

/// Bookkeeping for one entity index.
#[derive(Clone, Copy, Debug)]
struct EntitySlot {
    /// Live handle, or the handle the next reuse will hand out.
    entity: Entity,
    alive: bool,
}

/// Owner of every entity and component pool.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::default();
///
/// let entity = registry.create_entity();
/// registry.add_component(entity, Position::new(0.0, 1.0, 0.0))?;
/// registry.add_component(entity, Velocity::new(1.0, 0.0, 0.0))?;
///
/// registry.view::<(Position, Velocity)>().for_each(|_, pos, vel| {
///     pos.x += vel.x;
/// });
/// ```
pub struct Registry {
    /// Pools indexed by component type id.
    pools: Vec<PoolSlot>,
    /// Entity slots indexed by entity index.
    slots: Vec<EntitySlot>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Owning groups, ordered by type count.
    groups: Vec<Group>,
    context: PoolContext,
}

impl Registry {
    /// Creates an empty registry with a host buffer allocator sized from
    /// `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`EcsConfig::validate`]. Configs loaded with
    /// [`EcsConfig::from_toml_file`] are already validated.
    #[must_use]
    pub fn new(config: &EcsConfig) -> Self {
        Self::with_allocator(config, share_allocator(HostBufferAllocator::from_config(config)))
    }

    /// Creates an empty registry whose GPU-resident pools allocate from
    /// `allocator`.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`EcsConfig::validate`].
    #[must_use]
    pub fn with_allocator(config: &EcsConfig, allocator: SharedAllocator) -> Self {
        if let Err(err) = config.validate() {
            panic!("registry built from an unvalidated config: {err}");
        }

        Self {
            pools: Vec::new(),
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
            groups: Vec::new(),
            context: PoolContext {
                allocator,
                gpu_pool: config.gpu_pool,
            },
        }
    }

    /// Allocator shared by the GPU-resident pools.
    #[inline]
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.context.allocator
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates a new entity, reusing a freed index when one is available.
    ///
    /// # Returns
    ///
    /// The new entity, or [`Entity::INVALID`] if every index is in use.
    pub fn create_entity(&mut self) -> Entity {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            self.alive_count += 1;
            return slot.entity;
        }

        let index = self.slots.len() as u32;
        if index > Entity::MAX_INDEX {
            tracing::warn!(alive = self.alive_count, "entity index space exhausted");
            return Entity::INVALID;
        }

        let entity = Entity::new(index, 0);
        self.slots.push(EntitySlot {
            entity,
            alive: true,
        });
        self.alive_count += 1;
        entity
    }

    /// Destroys an entity and every component it owns.
    ///
    /// Removed events fire for each component. The index is recycled with
    /// the next generation.
    ///
    /// # Returns
    ///
    /// `true` if the entity was destroyed, `false` if it was already dead
    /// or the handle was stale.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_valid_entity(entity) {
            return false;
        }

        for id in 0..self.pools.len() {
            let owns = self.pools[id]
                .as_deref()
                .is_some_and(|pool| pool.contains(entity));
            if owns {
                self.remove_erased(id as u64, entity);
            }
        }

        let slot = &mut self.slots[entity.index() as usize];
        slot.entity = entity.next_generation();
        slot.alive = false;
        self.free_indices.push(entity.index());
        self.alive_count -= 1;
        true
    }

    /// Checks whether `entity` is alive and its generation is current.
    #[inline]
    #[must_use]
    pub fn is_valid_entity(&self, entity: Entity) -> bool {
        if entity.is_invalid() {
            return false;
        }
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.entity == entity)
    }

    /// Number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Visits every alive entity in index order.
    pub fn for_each_entity(&self, mut f: impl FnMut(Entity)) {
        for slot in &self.slots {
            if slot.alive {
                f(slot.entity);
            }
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches `component` to `entity`.
    ///
    /// Fires the pool's added event, then brings owning groups up to date.
    ///
    /// # Errors
    ///
    /// Only GPU-resident pools fail, when their buffer cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or already has a `T`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<&mut T> {
        assert!(self.is_valid_entity(entity), "{entity} is not a live entity");

        self.get_or_create_pool::<T>().emplace(entity, component)?;
        self.notify_added(component_type_id::<T>(), entity);
        Ok(self.get_component_mut(entity))
    }

    /// Returns the `T` of `entity`, attaching `make()` first if it has none.
    ///
    /// # Errors
    ///
    /// See [`add_component`](Self::add_component).
    pub fn get_or_add_component<T: Component>(
        &mut self,
        entity: Entity,
        make: impl FnOnce() -> T,
    ) -> EcsResult<&mut T> {
        if self.has_component::<T>(entity) {
            return Ok(self.get_component_mut(entity));
        }
        self.add_component(entity, make())
    }

    /// The `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no `T`. Check with
    /// [`has_component`](Self::has_component) or use
    /// [`try_get_component`](Self::try_get_component) instead.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        self.try_get_component(entity)
            .unwrap_or_else(|| panic!("{entity} has no {} component", std::any::type_name::<T>()))
    }

    /// Mutable `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.try_get_component_mut(entity)
            .unwrap_or_else(|| panic!("{entity} has no {} component", std::any::type_name::<T>()))
    }

    /// The `T` of `entity`, or `None`.
    #[must_use]
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.try_get(entity)
    }

    /// Mutable `T` of `entity`, or `None`.
    pub fn try_get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.try_get_mut(entity)
    }

    /// Checks whether `entity` has a `T`.
    #[inline]
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Checks whether `entity` has every component of `Q`.
    #[must_use]
    pub fn has_all_components<Q: ViewQuery>(&self, entity: Entity) -> bool {
        Q::type_ids().into_iter().all(|id| {
            self.pools
                .get(id as usize)
                .and_then(Option::as_deref)
                .is_some_and(|pool| pool.contains(entity))
        })
    }

    /// Detaches and destroys the `T` of `entity`.
    ///
    /// Owning groups are updated first, then the removed event fires.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        assert!(
            self.has_component::<T>(entity),
            "{entity} has no {} component",
            std::any::type_name::<T>()
        );
        self.remove_erased(component_type_id::<T>(), entity);
    }

    /// Destroys every `T`, firing removed events in dense order.
    pub fn clear_pool<T: Component>(&mut self) {
        let id = component_type_id::<T>();
        for group in &mut self.groups {
            if group.owns(id) {
                group.on_pool_cleared();
            }
        }
        if let Some(pool) = self.pool_mut::<T>() {
            pool.clear();
        }
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// The pool for `T`, if one was created.
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&T::Storage> {
        let pool = self.pools.get(component_type_id::<T>() as usize)?.as_deref()?;
        pool.as_any().downcast_ref::<T::Storage>()
    }

    /// The mutable pool for `T`, if one was created.
    ///
    /// Structural changes made directly on the pool bypass group upkeep;
    /// prefer the registry's component methods when groups are in use.
    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut T::Storage> {
        let pool = self
            .pools
            .get_mut(component_type_id::<T>() as usize)?
            .as_deref_mut()?;
        Some(downcast_pool::<T>(pool))
    }

    /// The pool for `T`, creating it on first use.
    pub fn get_or_create_pool<T: Component>(&mut self) -> &mut T::Storage {
        let id = component_type_id::<T>() as usize;
        if id >= self.pools.len() {
            self.pools.resize_with(id + 1, || None);
        }

        let context = &self.context;
        let pool = self.pools[id].get_or_insert_with(|| {
            tracing::trace!(
                component = std::any::type_name::<T>(),
                type_id = id,
                "component pool created"
            );
            Box::new(<T::Storage as Storage<T>>::create(context)) as Box<dyn ComponentStorage>
        });
        downcast_pool::<T>(&mut **pool)
    }

    /// Number of `T` components.
    #[inline]
    #[must_use]
    pub fn pool_size<T: Component>(&self) -> usize {
        self.pool::<T>().map_or(0, SparseStorage::len)
    }

    /// Event fired after a `T` is attached.
    pub fn component_added_event<T: Component>(&mut self) -> &mut ComponentEvent<T> {
        self.get_or_create_pool::<T>().added_event()
    }

    /// Event fired before a `T` is destroyed.
    pub fn component_removed_event<T: Component>(&mut self) -> &mut ComponentEvent<T> {
        self.get_or_create_pool::<T>().removed_event()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Builds a view over every entity owning all components of `Q`.
    #[doc(alias = "run_system")]
    pub fn view<Q: ViewQuery>(&mut self) -> View<'_, Q> {
        Q::ensure_pools(self);
        View::new(Q::fetch(&mut self.pools))
    }

    /// Returns the owning group over `Q`, creating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names fewer than two types, or if an existing group
    /// shares some but not all of its types in a non-nesting way.
    pub fn group<Q: ViewQuery>(&mut self) -> GroupView<'_, Q> {
        assert!(Q::ARITY >= 2, "a group needs at least two component types");
        Q::ensure_pools(self);

        let mut ids = Q::type_ids();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Q::ARITY, "component type listed twice in one group");

        let position = match self.groups.iter().position(|group| group.type_ids() == ids) {
            Some(position) => position,
            None => self.create_group(ids.clone()),
        };

        let len = self.groups[position].len();
        let nested = self
            .groups
            .iter()
            .enumerate()
            .any(|(i, group)| i != position && group.shares_types(&ids));
        GroupView::new(Q::fetch(&mut self.pools), len, nested)
    }

    /// Logs every pool's type and dense entity order.
    pub fn dump(&self) {
        tracing::debug!(
            alive = self.alive_count,
            pools = self.pools.iter().flatten().count(),
            groups = self.groups.len(),
            "registry dump"
        );
        for pool in self.pools.iter().flatten() {
            tracing::debug!(
                component = pool.component_type_name(),
                len = pool.len(),
                entities = ?pool.dense(),
                "pool"
            );
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn create_group(&mut self, ids: Vec<u64>) -> usize {
        let names: Vec<&str> = ids
            .iter()
            .map(|&id| component_type_name(id).unwrap_or("<unknown>"))
            .collect();

        let mut nested = false;
        for group in &self.groups {
            if group.shares_types(&ids) {
                assert!(
                    group.nests_with(&ids),
                    "group over {names:?} partially overlaps an existing group"
                );
                nested = true;
            }
        }

        let group = Group::build(ids, &mut self.pools, nested);
        tracing::debug!(types = ?names, len = group.len(), nested, "group created");

        let count = group.type_ids().len();
        let position = self
            .groups
            .partition_point(|existing| existing.type_ids().len() <= count);
        self.groups.insert(position, group);
        position
    }

    /// Smaller groups first, so nested prefixes grow from the outside in.
    fn notify_added(&mut self, id: u64, entity: Entity) {
        for group in &mut self.groups {
            if group.owns(id) {
                group.on_entity_added(entity, &mut self.pools);
            }
        }
    }

    /// Larger groups first, so nested prefixes shrink from the inside out.
    fn notify_removed(&mut self, id: u64, entity: Entity) {
        for group in self.groups.iter_mut().rev() {
            if group.owns(id) {
                group.on_entity_removed(entity, &mut self.pools);
            }
        }
    }

    fn remove_erased(&mut self, id: u64, entity: Entity) {
        self.notify_removed(id, entity);
        if let Some(pool) = self.pools.get_mut(id as usize).and_then(Option::as_deref_mut) {
            pool.remove(entity);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&EcsConfig::default())
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let alive: Vec<Entity> = self
            .slots
            .iter()
            .filter(|slot| slot.alive)
            .map(|slot| slot.entity)
            .collect();
        for entity in alive {
            self.destroy_entity(entity);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("alive_count", &self.alive_count)
            .field("pools", &self.pools.iter().flatten().count())
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GpuPoolConfig;
    use crate::ecs::view::IterationDecision;
    use bytemuck::{Pod, Zeroable};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Position(f32);
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Velocity(f32);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Frozen;
    crate::component!(Position, Velocity, Frozen);

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct Sprite {
        atlas: u32,
        frame: u32,
    }
    crate::gpu_component!(Sprite);

    #[test]
    fn test_create_destroy() {
        let mut registry = Registry::default();

        let first = registry.create_entity();
        assert!(registry.is_valid_entity(first));
        assert_eq!(registry.alive_count(), 1);

        let second = registry.create_entity();
        assert_eq!(registry.alive_count(), 2);

        assert!(registry.destroy_entity(first));
        assert!(!registry.is_valid_entity(first));
        assert!(!registry.destroy_entity(first));
        assert_eq!(registry.alive_count(), 1);

        // Reuses the slot with a new generation
        let third = registry.create_entity();
        assert_eq!(third.index(), first.index());
        assert_ne!(third.generation(), first.generation());
        assert!(!registry.is_valid_entity(first));
        assert!(registry.is_valid_entity(second));
        assert!(!registry.is_valid_entity(Entity::INVALID));
    }

    #[test]
    fn test_component_round_trip() {
        let mut registry = Registry::default();
        let entity = registry.create_entity();

        registry.add_component(entity, Position(1.0)).unwrap();
        assert!(registry.has_component::<Position>(entity));
        assert!(!registry.has_component::<Velocity>(entity));

        registry.get_component_mut::<Position>(entity).0 += 1.0;
        assert_eq!(*registry.get_component::<Position>(entity), Position(2.0));
        assert_eq!(registry.try_get_component::<Velocity>(entity), None);

        let velocity = registry.get_or_add_component(entity, || Velocity(3.0)).unwrap();
        assert_eq!(*velocity, Velocity(3.0));
        let velocity = registry.get_or_add_component(entity, || Velocity(9.0)).unwrap();
        assert_eq!(*velocity, Velocity(3.0));
        assert!(registry.has_all_components::<(Position, Velocity)>(entity));

        registry.remove_component::<Position>(entity);
        assert!(!registry.has_component::<Position>(entity));
        assert_eq!(registry.pool_size::<Position>(), 0);
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn test_double_add_panics() {
        let mut registry = Registry::default();
        let entity = registry.create_entity();
        registry.add_component(entity, Position(0.0)).unwrap();
        let _ = registry.add_component(entity, Position(0.0));
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn test_get_absent_panics() {
        let mut registry = Registry::default();
        let entity = registry.create_entity();
        registry.add_component(entity, Position(0.0)).unwrap();
        let _ = registry.get_component::<Velocity>(entity);
    }

    #[test]
    #[should_panic(expected = "not a live entity")]
    fn test_add_to_dead_entity_panics() {
        let mut registry = Registry::default();
        let entity = registry.create_entity();
        registry.destroy_entity(entity);
        let _ = registry.add_component(entity, Position(0.0));
    }

    #[test]
    fn test_destroy_fires_removed_events() {
        let mut registry = Registry::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        registry
            .component_removed_event::<Position>()
            .connect(move |entity, position| sink.lock().push((entity, position.0)));

        let entity = registry.create_entity();
        registry.add_component(entity, Position(5.0)).unwrap();
        registry.add_component(entity, Velocity(1.0)).unwrap();
        registry.destroy_entity(entity);

        assert_eq!(*log.lock(), vec![(entity, 5.0)]);
        assert_eq!(registry.pool_size::<Velocity>(), 0);
    }

    #[test]
    fn test_view_through_registry() {
        let mut registry = Registry::default();
        let mut moving = Vec::new();
        for i in 0..10 {
            let entity = registry.create_entity();
            registry.add_component(entity, Position(0.0)).unwrap();
            if i % 2 == 0 {
                registry.add_component(entity, Velocity(i as f32)).unwrap();
                moving.push(entity);
            }
        }

        registry
            .view::<(Position, Velocity)>()
            .for_each(|_, position, velocity| position.0 += velocity.0);

        for &entity in &moving {
            let expected = registry.get_component::<Velocity>(entity).0;
            assert_eq!(registry.get_component::<Position>(entity).0, expected);
        }

        let mut visited = 0;
        registry.view::<(Position,)>().for_each_cond(|_, _| {
            visited += 1;
            IterationDecision::Continue
        });
        assert_eq!(visited, 10);
    }

    #[test]
    fn test_group_tracks_changes() {
        let mut registry = Registry::default();
        let entities: Vec<Entity> = (0..8).map(|_| registry.create_entity()).collect();
        for &entity in &entities {
            registry.add_component(entity, Position(entity.index() as f32)).unwrap();
        }
        assert_eq!(registry.group::<(Position, Velocity)>().len(), 0);

        for &entity in entities.iter().step_by(2) {
            registry.add_component(entity, Velocity(1.0)).unwrap();
        }
        assert_eq!(registry.group::<(Position, Velocity)>().len(), 4);

        registry.remove_component::<Velocity>(entities[2]);
        registry.destroy_entity(entities[4]);

        let mut group = registry.group::<(Position, Velocity)>();
        assert_eq!(group.len(), 2);
        let mut seen = Vec::new();
        group.for_each(|entity, _, _| seen.push(entity));
        seen.sort();
        assert_eq!(seen, vec![entities[0], entities[6]]);

        registry.clear_pool::<Velocity>();
        assert!(registry.group::<(Position, Velocity)>().is_empty());
    }

    #[test]
    fn test_group_sort_by() {
        let mut registry = Registry::default();
        for value in [3.0, 1.0, 2.0] {
            let entity = registry.create_entity();
            registry.add_component(entity, Position(value)).unwrap();
            registry.add_component(entity, Velocity(value * 10.0)).unwrap();
        }

        let mut group = registry.group::<(Position, Velocity)>();
        group.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut pairs = Vec::new();
        group.for_each(|_, position, velocity| pairs.push((position.0, velocity.0)));
        assert_eq!(pairs, vec![(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]);

        let order: Vec<u32> = group.entities().iter().map(|entity| entity.index()).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_nested_groups() {
        let mut registry = Registry::default();
        let entities: Vec<Entity> = (0..6).map(|_| registry.create_entity()).collect();
        for (i, &entity) in entities.iter().enumerate() {
            registry.add_component(entity, Position(0.0)).unwrap();
            registry.add_component(entity, Velocity(0.0)).unwrap();
            if i % 2 == 1 {
                registry.add_component(entity, Frozen).unwrap();
            }
        }

        assert_eq!(registry.group::<(Position, Velocity)>().len(), 6);
        assert_eq!(registry.group::<(Position, Velocity, Frozen)>().len(), 3);

        registry.remove_component::<Velocity>(entities[1]);
        registry.add_component(entities[0], Frozen).unwrap();

        assert_eq!(registry.group::<(Position, Velocity)>().len(), 5);
        let mut outer = registry.group::<(Position, Velocity, Frozen)>();
        assert_eq!(outer.len(), 3);
        let mut seen = Vec::new();
        outer.for_each(|entity, _, _, _| seen.push(entity));
        seen.sort();
        assert_eq!(seen, vec![entities[0], entities[3], entities[5]]);
    }

    #[test]
    #[should_panic(expected = "partially overlaps")]
    fn test_overlapping_groups_panic() {
        let mut registry = Registry::default();
        let _ = registry.group::<(Position, Velocity)>();
        let _ = registry.group::<(Velocity, Frozen)>();
    }

    #[test]
    fn test_gpu_pool_through_registry() {
        let config = EcsConfig::default();
        let mut registry = Registry::new(&config);
        let entity = registry.create_entity();

        registry.add_component(entity, Sprite { atlas: 1, frame: 7 }).unwrap();
        let pool = registry.pool::<Sprite>().unwrap();
        assert!(pool.buffer_handle().is_some());
        assert_eq!(pool.capacity(), config.gpu_pool.initial_capacity);
        assert_eq!(registry.allocator().lock().stats().live_buffers, 1);

        drop(registry);
    }

    #[test]
    #[should_panic(expected = "initial_capacity")]
    fn test_zero_initial_capacity_config_rejected() {
        let config = EcsConfig {
            gpu_pool: GpuPoolConfig {
                initial_capacity: 0,
                growth_factor: 2,
            },
            ..EcsConfig::default()
        };
        let _ = Registry::new(&config);
    }

    #[test]
    #[should_panic(expected = "growth_factor")]
    fn test_unit_growth_factor_config_rejected() {
        let config = EcsConfig {
            gpu_pool: GpuPoolConfig {
                initial_capacity: 2,
                growth_factor: 1,
            },
            ..EcsConfig::default()
        };
        let _ = Registry::new(&config);
    }

    #[test]
    fn test_drop_fires_removed_events() {
        let count = Arc::new(Mutex::new(0));
        {
            let mut registry = Registry::default();
            let sink = Arc::clone(&count);
            registry
                .component_removed_event::<Position>()
                .connect(move |_, _| *sink.lock() += 1);
            for _ in 0..3 {
                let entity = registry.create_entity();
                registry.add_component(entity, Position(0.0)).unwrap();
            }
        }
        assert_eq!(*count.lock(), 3);
    }
}
