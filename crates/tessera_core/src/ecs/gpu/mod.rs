//! GPU-resident component storage and the device buffers behind it.

pub mod allocator;
pub mod pool;

pub use allocator::{
    share_allocator, AllocatorStats, BufferAllocator, BufferDescriptor, BufferHandle, BufferUsage,
    DeviceBuffer, HostBufferAllocator, SharedAllocator,
};
pub use pool::GpuComponentPool;
