//! # Component Traits
//!
//! Components are plain data attached to entities. Each component type picks
//! its storage statically through [`Component::Storage`]:
//!
//! - [`ComponentPool`](crate::ComponentPool) for CPU-only data
//! - [`GpuComponentPool`](crate::GpuComponentPool) for data the renderer
//!   binds directly as a device buffer
//!
//! The registry holds pools of many types behind [`ComponentStorage`] and
//! recovers the typed [`Storage`] with a downcast keyed by the type id.

use std::any::Any;

use super::entity::Entity;
use super::events::ComponentEvent;
use super::gpu::SharedAllocator;
use super::sparse_set::SparseStorage;
use crate::config::GpuPoolConfig;
use crate::error::EcsResult;

/// Marker trait for component types.
///
/// Usually implemented through [`component!`](crate::component) or
/// [`gpu_component!`](crate::gpu_component):
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug)]
/// struct Health(u32);
/// tessera_core::component!(Health);
/// ```
pub trait Component: Sized + Send + 'static {
    /// Pool type used to store this component.
    type Storage: Storage<Self> + 'static;
}

/// Type-erased view of a pool, as held by the registry.
///
/// Exposes only operations that do not need to know the component type.
pub trait ComponentStorage: SparseStorage + Send + 'static {
    /// Process-stable id of the stored component type.
    fn component_type_id(&self) -> u64;

    /// Rust name of the stored component type.
    fn component_type_name(&self) -> &'static str;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Resources a pool may need when the registry creates it.
#[derive(Clone)]
pub struct PoolContext {
    /// Allocator for device buffers.
    pub allocator: SharedAllocator,
    /// Growth policy for GPU-resident pools.
    pub gpu_pool: GpuPoolConfig,
}

impl std::fmt::Debug for PoolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolContext")
            .field("gpu_pool", &self.gpu_pool)
            .finish_non_exhaustive()
    }
}

/// Typed pool contract shared by every storage kind.
///
/// Component `i` of [`components`](Storage::components) always belongs to
/// entity `i` of [`dense`](SparseStorage::dense).
pub trait Storage<T>: ComponentStorage + Sized {
    /// Creates an empty pool.
    fn create(context: &PoolContext) -> Self;

    /// Inserts `entity` and stores `component` as the new last element.
    ///
    /// # Errors
    ///
    /// Only device-backed pools fail, when the backing buffer cannot grow.
    /// The pool is left unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a component in this pool.
    fn emplace(&mut self, entity: Entity, component: T) -> EcsResult<&mut T>;

    /// Contiguous component array in dense order.
    fn components(&self) -> &[T];

    /// Mutable contiguous component array in dense order.
    fn components_mut(&mut self) -> &mut [T];

    /// Dense entities alongside their mutable components.
    fn entities_and_components_mut(&mut self) -> (&[Entity], &mut [T]);

    /// Event fired after a component is stored.
    fn added_event(&mut self) -> &mut ComponentEvent<T>;

    /// Event fired before a component is dropped.
    fn removed_event(&mut self) -> &mut ComponentEvent<T>;

    /// Component of `entity`. Requires `contains(entity)`.
    #[inline]
    fn get(&self, entity: Entity) -> &T {
        &self.components()[self.sparse_index(entity)]
    }

    /// Mutable component of `entity`. Requires `contains(entity)`.
    #[inline]
    fn get_mut(&mut self, entity: Entity) -> &mut T {
        let index = self.sparse_index(entity);
        &mut self.components_mut()[index]
    }

    /// Component of `entity`, or `None` if absent.
    #[inline]
    fn try_get(&self, entity: Entity) -> Option<&T> {
        self.contains(entity).then(|| self.get(entity))
    }

    /// Mutable component of `entity`, or `None` if absent.
    #[inline]
    fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        if self.contains(entity) {
            Some(self.get_mut(entity))
        } else {
            None
        }
    }

    /// Component at dense position `index`.
    #[inline]
    fn get_by_index(&self, index: usize) -> &T {
        &self.components()[index]
    }

    /// Mutable component at dense position `index`.
    #[inline]
    fn get_by_index_mut(&mut self, index: usize) -> &mut T {
        &mut self.components_mut()[index]
    }

    /// Number of stored components, always equal to `len()`.
    #[inline]
    fn component_count(&self) -> usize {
        self.components().len()
    }
}

/// Implements [`Component`] with CPU [`ComponentPool`](crate::ComponentPool)
/// storage for each listed type.
#[macro_export]
macro_rules! component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Component for $ty {
                type Storage = $crate::ComponentPool<$ty>;
            }
        )+
    };
}

/// Implements [`Component`] with [`GpuComponentPool`](crate::GpuComponentPool)
/// storage for each listed type. The types must be `bytemuck::Pod`.
#[macro_export]
macro_rules! gpu_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Component for $ty {
                type Storage = $crate::GpuComponentPool<$ty>;
            }
        )+
    };
}
