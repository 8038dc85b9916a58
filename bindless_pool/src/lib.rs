/*!
# Bindless Pool

Generation-counted object pools with reference-counted handles, a
process-wide pool/allocator registry, and bindless descriptor index
management for GPU resources.

## Architecture

- **ResourcePool**: fixed-capacity slot pool, one per value type
- **Handle**: 8-byte ref-counted reference into a registered pool
- **Registry**: process-wide table of pools and memory allocators
- **BindlessTable**: shader-visible descriptor indices, recycled only after
  the frames that could still read them have retired
- **ResourceManager**: buffers, images, samplers and materials created with
  their bindless index already written

Backends (Vulkan, ...) provide a `DescriptorWriter` that copies descriptors
into their per-frame descriptor sets.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
mod config;
mod bindless;
mod pool;
mod registry;
mod resource;
mod utils;

#[cfg(test)]
mod test_utils;

// Main bpool namespace module
pub mod bpool {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{PoolConfig, PoolIds, MAX_FRAMES_IN_FLIGHT};

    // Pools and handles
    pub use crate::pool::{ErasedPool, Finalize, Handle, Poolable, RawHandle, ResourcePool};
    pub use crate::utils::IndexAllocator;

    // Registry
    pub use crate::registry::{
        AllocatorId, AllocatorStats, DebugAllocator, MemoryAllocator, PoolId, Registry,
        MAX_ALLOCATORS, MAX_POOLS,
    };

    // Bindless descriptors
    pub use crate::bindless::{
        BindlessIndex, BindlessKind, BindlessState, BindlessTable, DescriptorResource,
        DescriptorWriter,
    };

    // GPU resources
    pub use crate::resource::{
        BindlessSlot, GpuBuffer, GpuBufferDesc, GpuImage, GpuImageDesc, GpuSampler,
        GpuSamplerDesc, Material, MaterialDataRange, MaterialDesc, MaterialGpuData,
        MaterialTextureDesc, ResourceManager, ResourceManagerDesc, ResourceStats,
        MAX_MATERIAL_TEXTURES, NO_BINDLESS_INDEX,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }
}
