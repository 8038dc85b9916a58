//! Process-wide pool and allocator tables

mod memory_allocator;
mod registry;

pub use memory_allocator::{AllocatorStats, DebugAllocator, MemoryAllocator};
pub use registry::{AllocatorId, PoolId, Registry, MAX_ALLOCATORS, MAX_POOLS};
