//! # Tessera Core
//!
//! Sparse-set entity/component storage for the engine:
//! - O(1) add, remove and lookup per component type
//! - Contiguous, cache-friendly component arrays
//! - GPU-resident pools whose dense array backs a device buffer
//!
//! ## Architecture Rules
//!
//! 1. **Dense arrays stay packed** - removal swaps the last element in
//! 2. **Contract violations panic** - double insert, absent removal and
//!    stale lookups are programmer errors, never `Err`
//! 3. **Only resource exhaustion is recoverable** - GPU pool growth returns
//!    [`EcsError`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{component, Registry};
//!
//! #[derive(Clone, Copy)]
//! struct Position([f32; 3]);
//! #[derive(Clone, Copy)]
//! struct Velocity([f32; 3]);
//! component!(Position, Velocity);
//!
//! let mut registry = Registry::default();
//! let entity = registry.create_entity();
//! registry.add_component(entity, Position([0.0; 3]))?;
//! registry.add_component(entity, Velocity([1.0, 0.0, 0.0]))?;
//!
//! registry.view::<(Position, Velocity)>().for_each(|_, pos, vel| {
//!     pos.0[0] += vel.0[0];
//! });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::{EcsConfig, GpuPoolConfig};
pub use ecs::{
    component_type_id, component_type_name, registered_type_count, share_allocator,
    AllocatorStats, BufferAllocator, BufferDescriptor, BufferHandle, BufferUsage, Component,
    ComponentEvent, ComponentPool, ComponentStorage, ConnectionId, DeviceBuffer, Entity,
    GpuComponentPool, GroupView, HostBufferAllocator, IterationDecision, PoolContext, PoolSlot,
    Registry, SharedAllocator, SparseSet, SparseStorage, Storage, View, ViewQuery,
};
pub use error::{EcsError, EcsResult};
