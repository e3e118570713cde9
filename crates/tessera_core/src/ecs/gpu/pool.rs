//! # GPU-Resident Component Pool
//!
//! A [`ComponentPool`](crate::ComponentPool) variant whose dense component
//! array lives inside the mapped memory of a device buffer. There is no
//! host-side copy: the renderer binds [`buffer_handle`](GpuComponentPool::buffer_handle)
//! and sees exactly the bytes returned by [`as_bytes`](GpuComponentPool::as_bytes).
//!
//! ```text
//! mapping:  [ c3 c1 c4 | 0 0 0 0 0 ]
//!             |<-len->|
//!             |<---- capacity ---->|
//! ```
//!
//! ## Capacity
//!
//! The buffer has a fixed element capacity. When a full pool receives a new
//! component it allocates a larger buffer according to [`GpuPoolConfig`],
//! copies the live prefix across and releases the old one. That relocation
//! invalidates any handle cached from `buffer_handle`; consumers compare
//! [`relocation_count`](GpuComponentPool::relocation_count) across frames.
//!
//! ## Events
//!
//! - "added" fires after every successful emplace
//! - "removed" fires before a component is destroyed, on remove and clear
//!
//! Swap-removal moves the last component into the freed slot without firing
//! anything, so dense indices must be re-resolved every frame.

use std::any::Any;

use bytemuck::{Pod, Zeroable};

use super::allocator::{BufferDescriptor, BufferHandle, BufferUsage, DeviceBuffer, SharedAllocator};
use crate::config::GpuPoolConfig;
use crate::ecs::component::{Component, ComponentStorage, PoolContext, Storage};
use crate::ecs::entity::Entity;
use crate::ecs::events::ComponentEvent;
use crate::ecs::sparse_set::{SparseSet, SparseStorage};
use crate::ecs::type_id::component_type_id;
use crate::error::{EcsError, EcsResult};

/// The first `len` elements of `buffer`'s mapping, typed.
#[inline]
fn mapped<T: Pod>(buffer: Option<&DeviceBuffer>, len: usize) -> &[T] {
    match buffer {
        Some(buffer) => bytemuck::cast_slice(&buffer.bytes()[..len * std::mem::size_of::<T>()]),
        None => &[],
    }
}

/// The first `len` elements of `buffer`'s mapping, typed and writable.
#[inline]
fn mapped_mut<T: Pod>(buffer: Option<&mut DeviceBuffer>, len: usize) -> &mut [T] {
    match buffer {
        Some(buffer) => {
            bytemuck::cast_slice_mut(&mut buffer.bytes_mut()[..len * std::mem::size_of::<T>()])
        }
        None => &mut [],
    }
}

/// Component storage kept in a device buffer.
///
/// `T` must be [`Pod`] so the dense array can be viewed as raw bytes, and
/// its alignment must not exceed [`DeviceBuffer::MAPPING_ALIGN`].
pub struct GpuComponentPool<T: Pod + Send> {
    set: SparseSet,
    /// Current backing buffer, allocated on first use. Its mapping holds the
    /// components, index-aligned with `set`.
    buffer: Option<DeviceBuffer>,
    /// Element capacity of `buffer`.
    capacity: usize,
    allocator: SharedAllocator,
    policy: GpuPoolConfig,
    usage: BufferUsage,
    relocations: u64,
    added: ComponentEvent<T>,
    removed: ComponentEvent<T>,
}

impl<T: Pod + Send> GpuComponentPool<T> {
    /// Creates an empty pool. No buffer is allocated until the first insert
    /// or [`reserve`](Self::reserve).
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or aligned beyond
    /// [`DeviceBuffer::MAPPING_ALIGN`].
    #[must_use]
    pub fn new(allocator: SharedAllocator, policy: GpuPoolConfig) -> Self {
        assert!(
            std::mem::size_of::<T>() > 0,
            "zero-sized type {} cannot be GPU-resident",
            std::any::type_name::<T>()
        );
        assert!(
            std::mem::align_of::<T>() <= DeviceBuffer::MAPPING_ALIGN,
            "{} is aligned beyond what a buffer mapping guarantees",
            std::any::type_name::<T>()
        );

        Self {
            set: SparseSet::new(),
            buffer: None,
            capacity: 0,
            allocator,
            policy,
            usage: BufferUsage::default(),
            relocations: 0,
            added: ComponentEvent::new(),
            removed: ComponentEvent::new(),
        }
    }

    /// Sets the usage flags for buffers allocated from now on.
    #[must_use]
    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Stores `component` for `entity`, growing the buffer if it is full.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if the buffer cannot grow. The pool is
    /// left unchanged and no event fires.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a component in this pool.
    pub fn insert(&mut self, entity: Entity, component: T) -> EcsResult<&mut T> {
        assert!(
            !self.set.contains(entity),
            "{entity} already has a {} component",
            std::any::type_name::<T>()
        );

        let index = self.set.len();
        if index == self.capacity {
            self.reserve(self.policy.next_capacity(self.capacity))?;
        }
        assert!(index < self.capacity, "GPU pool grew without adding room");

        mapped_mut::<T>(self.buffer.as_mut(), index + 1)[index] = component;
        self.set.insert(entity);

        let components = mapped_mut::<T>(self.buffer.as_mut(), index + 1);
        self.added.fire(entity, &mut components[index]);
        Ok(&mut components[index])
    }

    /// Removes the component of `entity` and returns it.
    ///
    /// The last component moves into the freed slot and the vacated tail
    /// slot is zeroed.
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

        let len = self.set.len();
        let index = self.set.sparse_index(entity);
        let components = mapped_mut::<T>(self.buffer.as_mut(), len);
        self.removed.fire(entity, &mut components[index]);

        let component = components[index];
        components[index] = components[len - 1];
        components[len - 1] = T::zeroed();
        self.set.remove(entity);
        component
    }

    /// Grows the backing buffer to hold at least `capacity` elements.
    ///
    /// Does nothing if the buffer is already large enough. Otherwise a new
    /// buffer is allocated, the live components are copied into it and the
    /// old one is released, which counts as a relocation.
    ///
    /// # Errors
    ///
    /// [`EcsError::OutOfDeviceMemory`] or [`EcsError::HostAllocation`] from
    /// the allocator. Either way the current buffer stays in place.
    ///
    /// # Panics
    ///
    /// Panics if the allocator returns a buffer smaller than requested.
    pub fn reserve(&mut self, capacity: usize) -> EcsResult<()> {
        if capacity <= self.capacity {
            return Ok(());
        }

        let element_size = std::mem::size_of::<T>();
        let size_bytes = capacity
            .checked_mul(element_size)
            .ok_or(EcsError::HostAllocation {
                requested_bytes: u64::MAX,
            })?;

        let descriptor = BufferDescriptor {
            label: std::any::type_name::<T>(),
            size_bytes: size_bytes as u64,
            usage: self.usage,
        };
        let mut new_buffer = self.allocator.lock().allocate(&descriptor)?;
        assert!(
            new_buffer.size_bytes() >= descriptor.size_bytes,
            "allocator returned {} bytes for a {}-byte request",
            new_buffer.size_bytes(),
            descriptor.size_bytes
        );

        let old_capacity = self.capacity;
        let live_bytes = self.set.len() * element_size;
        if let Some(old) = self.buffer.take() {
            new_buffer.bytes_mut()[..live_bytes].copy_from_slice(&old.bytes()[..live_bytes]);
            self.allocator.lock().release(old);
            self.relocations += 1;
        }
        self.buffer = Some(new_buffer);
        self.capacity = capacity;

        tracing::debug!(
            component = descriptor.label,
            old_capacity,
            new_capacity = capacity,
            bytes = descriptor.size_bytes,
            "GPU pool buffer grown"
        );
        Ok(())
    }

    /// Handle of the current backing buffer, `None` before the first
    /// allocation. Invalidated by the next relocation.
    #[inline]
    #[must_use]
    pub fn buffer_handle(&self) -> Option<BufferHandle> {
        self.buffer.as_ref().map(DeviceBuffer::handle)
    }

    /// Live components as raw bytes. This is a view of the buffer mapping,
    /// not a copy.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.live())
    }

    /// Element capacity of the backing buffer.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte size of the backing buffer.
    #[inline]
    #[must_use]
    pub fn byte_capacity(&self) -> u64 {
        self.buffer.as_ref().map_or(0, DeviceBuffer::size_bytes)
    }

    /// Number of times the buffer has been replaced by a larger one.
    #[inline]
    #[must_use]
    pub fn relocation_count(&self) -> u64 {
        self.relocations
    }

    /// Usage flags of newly allocated buffers.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    fn live(&self) -> &[T] {
        mapped(self.buffer.as_ref(), self.set.len())
    }

    #[inline]
    fn live_mut(&mut self) -> &mut [T] {
        mapped_mut(self.buffer.as_mut(), self.set.len())
    }
}

impl<T: Pod + Send> Drop for GpuComponentPool<T> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.allocator.lock().release(buffer);
        }
    }
}

impl<T: Pod + Send> std::fmt::Debug for GpuComponentPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuComponentPool")
            .field("type", &std::any::type_name::<T>())
            .field("dense", &self.set.dense())
            .field("capacity", &self.capacity)
            .field("buffer", &self.buffer_handle())
            .finish_non_exhaustive()
    }
}

impl<T: Pod + Send> SparseStorage for GpuComponentPool<T> {
    #[inline]
    fn sparse_set(&self) -> &SparseSet {
        &self.set
    }

    #[inline]
    fn swap(&mut self, i: usize, j: usize) {
        self.live_mut().swap(i, j);
        self.set.swap(i, j);
    }

    fn remove(&mut self, entity: Entity) {
        self.take(entity);
    }

    /// Fires "removed" for every component in dense order, then empties the
    /// pool and zeroes the mapping. The buffer is kept.
    fn clear(&mut self) {
        let components = mapped_mut::<T>(self.buffer.as_mut(), self.set.len());
        if !self.removed.is_empty() {
            for (entity, component) in self.set.dense().iter().zip(components.iter_mut()) {
                self.removed.fire(*entity, component);
            }
        }
        components.fill(T::zeroed());
        self.set.clear();
    }
}

impl<T: Pod + Send> ComponentStorage for GpuComponentPool<T> {
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

impl<T: Component + Pod> Storage<T> for GpuComponentPool<T> {
    fn create(context: &PoolContext) -> Self {
        Self::new(context.allocator.clone(), context.gpu_pool)
    }

    fn emplace(&mut self, entity: Entity, component: T) -> EcsResult<&mut T> {
        self.insert(entity, component)
    }

    #[inline]
    fn components(&self) -> &[T] {
        self.live()
    }

    #[inline]
    fn components_mut(&mut self) -> &mut [T] {
        self.live_mut()
    }

    #[inline]
    fn entities_and_components_mut(&mut self) -> (&[Entity], &mut [T]) {
        let len = self.set.len();
        (self.set.dense(), mapped_mut(self.buffer.as_mut(), len))
    }

    fn added_event(&mut self) -> &mut ComponentEvent<T> {
        &mut self.added
    }

    fn removed_event(&mut self) -> &mut ComponentEvent<T> {
        &mut self.removed
    }
}
