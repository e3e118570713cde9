//! # Device Buffer Allocation
//!
//! GPU-resident pools request their backing buffers through the
//! [`BufferAllocator`] trait. The renderer provides a device-backed
//! implementation; [`HostBufferAllocator`] is the host-memory implementation
//! used for headless runs and tests. It enforces a byte budget so exhaustion
//! surfaces as [`EcsError::OutOfDeviceMemory`] exactly like a real device.

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};

bitflags! {
    /// How a device buffer will be bound by the renderer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Bound as a vertex/instance buffer.
        const VERTEX = 1 << 0;
        /// Bound as an index buffer.
        const INDEX = 1 << 1;
        /// Bound as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Bound as a storage buffer.
        const STORAGE = 1 << 3;
        /// Source of a transfer.
        const COPY_SRC = 1 << 4;
        /// Destination of a transfer.
        const COPY_DST = 1 << 5;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::VERTEX | Self::COPY_SRC
    }
}

/// Opaque handle naming one device buffer allocation.
///
/// Handles are invalidated when their buffer is released; a reused slot gets
/// a new generation, so a stale handle never aliases a live buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

impl BufferHandle {
    /// Creates a handle. Intended for allocator implementations.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Allocator slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at allocation time.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Parameters of a buffer request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Debug label, usually the component type name.
    pub label: &'static str,
    /// Requested size in bytes.
    pub size_bytes: u64,
    /// Intended bindings.
    pub usage: BufferUsage,
}

/// Word type of a buffer mapping. Its alignment bounds the alignment of
/// components that can live in a mapped buffer.
pub type MappingWord = u64;

/// A live allocation returned by [`BufferAllocator::allocate`].
///
/// Owns the buffer's host-visible, persistently mapped memory. GPU-resident
/// pools keep their dense component array directly in this region, so the
/// bytes behind [`handle`](Self::handle) are always the pool's live data.
///
/// Must be handed back through [`BufferAllocator::release`].
pub struct DeviceBuffer {
    handle: BufferHandle,
    size_bytes: u64,
    usage: BufferUsage,
    /// Zero-initialized mapping, rounded up to whole words.
    mapping: Box<[MappingWord]>,
}

impl DeviceBuffer {
    /// Alignment every mapping starts at.
    pub const MAPPING_ALIGN: usize = std::mem::align_of::<MappingWord>();

    /// Maps a zeroed region of `size_bytes` for a new allocation. Intended
    /// for allocator implementations.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::HostAllocation`] if the mapping cannot be
    /// allocated.
    pub fn new(handle: BufferHandle, size_bytes: u64, usage: BufferUsage) -> EcsResult<Self> {
        let failed = || EcsError::HostAllocation {
            requested_bytes: size_bytes,
        };

        let word_size = std::mem::size_of::<MappingWord>() as u64;
        let words = usize::try_from(size_bytes.div_ceil(word_size)).map_err(|_| failed())?;
        let mut mapping: Vec<MappingWord> = Vec::new();
        mapping.try_reserve_exact(words).map_err(|_| failed())?;
        mapping.resize(words, 0);

        Ok(Self {
            handle,
            size_bytes,
            usage,
            mapping: mapping.into_boxed_slice(),
        })
    }

    /// Handle for descriptor bindings.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Size in bytes.
    #[inline]
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Bindings the buffer was created for.
    #[inline]
    #[must_use]
    pub const fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The mapped bytes, `size_bytes` long.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<MappingWord, u8>(&self.mapping)[..self.size_bytes as usize]
    }

    /// The mapped bytes, writable.
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<MappingWord, u8>(&mut self.mapping)[..self.size_bytes as usize]
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("handle", &self.handle)
            .field("size_bytes", &self.size_bytes)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Allocation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Buffers currently allocated.
    pub live_buffers: usize,
    /// Bytes currently allocated.
    pub used_bytes: u64,
    /// Highest `used_bytes` seen.
    pub peak_bytes: u64,
    /// Total bytes the allocator may hand out.
    pub budget_bytes: u64,
}

/// Source of device buffers for GPU-resident pools.
pub trait BufferAllocator {
    /// Allocates a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::OutOfDeviceMemory`] when the request cannot be met.
    fn allocate(&mut self, descriptor: &BufferDescriptor) -> EcsResult<DeviceBuffer>;

    /// Returns a buffer to the allocator.
    fn release(&mut self, buffer: DeviceBuffer);

    /// Current counters.
    fn stats(&self) -> AllocatorStats;
}

/// Allocator shared by every GPU-resident pool of a registry.
pub type SharedAllocator = Arc<Mutex<dyn BufferAllocator + Send>>;

/// Wraps an allocator for sharing between pools.
#[must_use]
pub fn share_allocator<A>(allocator: A) -> SharedAllocator
where
    A: BufferAllocator + Send + 'static,
{
    Arc::new(Mutex::new(allocator))
}

/// Bookkeeping for one allocator slot.
#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    /// Size of the live allocation, `None` while free.
    size_bytes: Option<u64>,
}

/// Budgeted allocator backed by host memory.
///
/// Slots are recycled through a free list, so handles stay small and dense.
/// Each buffer's mapping is plain host memory owned by the [`DeviceBuffer`].
///
/// # Thread Safety
///
/// Not thread-safe on its own. Share it through [`SharedAllocator`].
#[derive(Debug)]
pub struct HostBufferAllocator {
    slots: Vec<Slot>,
    /// Indices of free slots.
    free_list: Vec<u32>,
    budget_bytes: u64,
    used_bytes: u64,
    peak_bytes: u64,
    live_buffers: usize,
}

impl HostBufferAllocator {
    /// Creates an allocator that may hand out up to `budget_bytes`.
    #[must_use]
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            budget_bytes,
            used_bytes: 0,
            peak_bytes: 0,
            live_buffers: 0,
        }
    }

    /// Creates an allocator with the budget from `config`.
    #[must_use]
    pub fn from_config(config: &EcsConfig) -> Self {
        Self::new(config.device_budget_bytes)
    }

    /// Bytes still available.
    #[inline]
    #[must_use]
    pub const fn available_bytes(&self) -> u64 {
        self.budget_bytes - self.used_bytes
    }

    /// Checks whether `handle` names a live allocation.
    #[must_use]
    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.size_bytes.is_some())
    }
}

impl BufferAllocator for HostBufferAllocator {
    fn allocate(&mut self, descriptor: &BufferDescriptor) -> EcsResult<DeviceBuffer> {
        let available = self.available_bytes();
        if descriptor.size_bytes > available {
            tracing::warn!(
                label = descriptor.label,
                requested = descriptor.size_bytes,
                available,
                "device buffer budget exhausted"
            );
            return Err(EcsError::OutOfDeviceMemory {
                requested: descriptor.size_bytes,
                available,
            });
        }

        let index = if let Some(index) = self.free_list.pop() {
            index
        } else {
            self.slots.push(Slot {
                generation: 0,
                size_bytes: None,
            });
            (self.slots.len() - 1) as u32
        };

        let generation = self.slots[index as usize].generation;
        let buffer = match DeviceBuffer::new(
            BufferHandle::new(index, generation),
            descriptor.size_bytes,
            descriptor.usage,
        ) {
            Ok(buffer) => buffer,
            Err(err) => {
                self.free_list.push(index);
                return Err(err);
            }
        };

        self.slots[index as usize].size_bytes = Some(descriptor.size_bytes);

        self.used_bytes += descriptor.size_bytes;
        self.peak_bytes = self.peak_bytes.max(self.used_bytes);
        self.live_buffers += 1;

        Ok(buffer)
    }

    fn release(&mut self, buffer: DeviceBuffer) {
        let handle = buffer.handle();
        assert!(
            self.is_live(handle),
            "buffer {handle:?} released twice or not owned by this allocator"
        );

        let slot = &mut self.slots[handle.index as usize];
        slot.size_bytes = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);

        self.used_bytes -= buffer.size_bytes();
        self.live_buffers -= 1;
    }

    fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            live_buffers: self.live_buffers,
            used_bytes: self.used_bytes,
            peak_bytes: self.peak_bytes,
            budget_bytes: self.budget_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(size_bytes: u64) -> BufferDescriptor {
        BufferDescriptor {
            label: "test",
            size_bytes,
            usage: BufferUsage::default(),
        }
    }

    #[test]
    fn test_allocate_release() {
        let mut allocator = HostBufferAllocator::new(1024);

        let buffer = allocator.allocate(&descriptor(256)).unwrap();
        assert!(allocator.is_live(buffer.handle()));
        assert_eq!(allocator.stats().used_bytes, 256);
        assert_eq!(allocator.stats().live_buffers, 1);

        let handle = buffer.handle();
        allocator.release(buffer);
        assert!(!allocator.is_live(handle));
        assert_eq!(allocator.stats().used_bytes, 0);
        assert_eq!(allocator.stats().peak_bytes, 256);
    }

    #[test]
    fn test_budget_exhausted() {
        let mut allocator = HostBufferAllocator::new(512);
        let _held = allocator.allocate(&descriptor(400)).unwrap();

        let err = allocator.allocate(&descriptor(200)).unwrap_err();
        assert_eq!(
            err,
            EcsError::OutOfDeviceMemory {
                requested: 200,
                available: 112
            }
        );
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut allocator = HostBufferAllocator::new(1024);

        let first = allocator.allocate(&descriptor(64)).unwrap();
        let first_handle = first.handle();
        allocator.release(first);

        let second = allocator.allocate(&descriptor(64)).unwrap();
        assert_eq!(second.handle().index(), first_handle.index());
        assert_ne!(second.handle(), first_handle);
        assert!(!allocator.is_live(first_handle));
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn test_foreign_release_panics() {
        let mut allocator = HostBufferAllocator::new(1024);
        allocator.release(
            DeviceBuffer::new(BufferHandle::new(3, 0), 64, BufferUsage::STORAGE).unwrap(),
        );
    }

    #[test]
    fn test_mapping_is_zeroed_and_writable() {
        let mut allocator = HostBufferAllocator::new(1024);
        let mut buffer = allocator.allocate(&descriptor(13)).unwrap();

        assert_eq!(buffer.bytes(), &[0u8; 13]);
        buffer.bytes_mut()[12] = 0xAB;
        assert_eq!(buffer.bytes()[12], 0xAB);
        assert_eq!(buffer.bytes().as_ptr() as usize % DeviceBuffer::MAPPING_ALIGN, 0);
        allocator.release(buffer);
    }

    #[test]
    fn test_default_usage() {
        assert!(BufferUsage::default().contains(BufferUsage::VERTEX));
        assert!(BufferUsage::default().contains(BufferUsage::COPY_SRC));
        assert!(!BufferUsage::default().contains(BufferUsage::STORAGE));
    }
}
