//! # Entity Component System
//!
//! Sparse-set component storage.
//!
//! ## Design Philosophy
//!
//! - One pool per component type, each a sparse set plus an index-aligned
//!   dense component array
//! - Entity ids are indices with generation counters
//! - Removal is a swap with the last element, so dense arrays never have holes
//! - Queries intersect pools from the smallest one; owning groups trade
//!   insert/remove cost for check-free iteration

mod component;
mod entity;
mod events;
pub mod gpu;
mod group;
mod pool;
mod registry;
mod sparse_set;
mod type_id;
mod view;

pub use component::{Component, ComponentStorage, PoolContext, Storage};
pub use entity::Entity;
pub use events::{ComponentEvent, ConnectionId};
pub use gpu::{
    share_allocator, AllocatorStats, BufferAllocator, BufferDescriptor, BufferHandle, BufferUsage,
    DeviceBuffer, GpuComponentPool, HostBufferAllocator, SharedAllocator,
};
pub use group::GroupView;
pub use pool::ComponentPool;
pub use registry::Registry;
pub use sparse_set::{SparseSet, SparseStorage};
pub use type_id::{component_type_id, component_type_name, registered_type_count};
pub use view::{IterationDecision, PoolSlot, View, ViewQuery};
