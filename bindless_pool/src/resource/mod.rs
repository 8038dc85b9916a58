//! Pooled GPU resources and the manager that creates them

mod bindless_slot;
mod buffer;
mod image;
mod material;
mod resource_manager;
mod sampler;

pub use bindless_slot::BindlessSlot;
pub use buffer::{GpuBuffer, GpuBufferDesc};
pub use image::{GpuImage, GpuImageDesc};
pub use material::{
    Material, MaterialDataRange, MaterialDesc, MaterialGpuData, MaterialTextureDesc,
    MAX_MATERIAL_TEXTURES, NO_BINDLESS_INDEX,
};
pub use resource_manager::{ResourceManager, ResourceManagerDesc, ResourceStats};
pub use sampler::{GpuSampler, GpuSamplerDesc};

use crate::error::Error;
use crate::log::log_error;

/// Log and build an `InvalidResource` error
#[track_caller]
pub(crate) fn invalid_resource(source: &str, message: String) -> Error {
    log_error(source, Error::InvalidResource(message))
}
