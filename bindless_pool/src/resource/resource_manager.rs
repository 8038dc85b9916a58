/// Central resource manager
///
/// Owns the bindless table and the four resource pools (buffers, images,
/// samplers, materials), registered in the process registry at the ids
/// given by the configuration. Creation hands out pool handles whose values
/// already carry their bindless index; dropping the last handle sends the
/// index into quarantine.

use std::sync::Arc;

use crate::bindless::{BindlessKind, BindlessTable, DescriptorResource, DescriptorWriter};
use crate::config::PoolConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::log::log_error;
use crate::pool::{Finalize, Handle, Poolable, ResourcePool};
use crate::registry::{PoolId, Registry};
use crate::resource::{
    invalid_resource, BindlessSlot, GpuBuffer, GpuBufferDesc, GpuImage, GpuImageDesc,
    GpuSampler, GpuSamplerDesc, Material, MaterialDesc, MaterialGpuData,
};
use crate::{engine_debug, engine_info};

/// Resource manager creation descriptor
pub struct ResourceManagerDesc {
    pub config: PoolConfig,
    /// Backend descriptor writer (one descriptor set per frame in flight)
    pub writer: Box<dyn DescriptorWriter>,
}

/// Snapshot of pool and bindless usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub buffers: u32,
    pub images: u32,
    pub samplers: u32,
    pub materials: u32,
    /// Bindless indices waiting for their frames to retire, all kinds
    pub pending_bindless: u32,
}

pub struct ResourceManager {
    config: PoolConfig,
    bindless: Arc<BindlessTable>,
    registry: &'static Registry,
}

impl ResourceManager {
    /// Validate the configuration, create the bindless table and register the pools
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` for an invalid configuration or when the
    ///   engine is not initialized
    /// - `PoolAlreadyRegistered` if any configured pool id is taken (nothing
    ///   is registered in that case)
    pub fn new(desc: ResourceManagerDesc) -> Result<Self> {
        let config = desc.config;
        config.validate()?;
        let registry = Engine::registry()?;

        let ids = config.pool_ids;
        if let Some(taken) = ids.all().into_iter().find(|id| registry.is_pool_registered(*id)) {
            return Err(log_error(
                "bpool::ResourceManager",
                Error::PoolAlreadyRegistered(taken.get()),
            ));
        }

        let bindless = Arc::new(BindlessTable::new(&config, desc.writer)?);

        register::<GpuBuffer>(registry, ids.buffers, config.max_buffers, "gpu_buffers")?;
        register::<GpuImage>(registry, ids.images, config.max_images, "gpu_images")?;
        register::<GpuSampler>(registry, ids.samplers, config.max_samplers, "gpu_samplers")?;
        register::<Material>(registry, ids.materials, config.max_materials, "materials")?;

        engine_info!("bpool::ResourceManager",
            "Created: pools {}/{}/{}/{}, {} frames in flight",
            ids.buffers.get(), ids.images.get(), ids.samplers.get(), ids.materials.get(),
            config.frames_in_flight);

        Ok(Self { config, bindless, registry })
    }

    // ===== CREATION =====

    /// Create a buffer and expose it through a bindless storage-buffer index
    pub fn create_buffer(&self, desc: GpuBufferDesc) -> Result<Handle<GpuBuffer>> {
        desc.validate()?;
        let handle = Handle::<GpuBuffer>::new(self.config.pool_ids.buffers)?;
        let slot = self.assign(&desc.descriptor())?;
        install(&handle, GpuBuffer::new(desc, slot))?;
        Ok(handle)
    }

    /// Create an image and expose it through a bindless sampled-image index
    pub fn create_image(&self, desc: GpuImageDesc) -> Result<Handle<GpuImage>> {
        desc.validate()?;
        let handle = Handle::<GpuImage>::new(self.config.pool_ids.images)?;
        let slot = self.assign(&desc.descriptor())?;
        install(&handle, GpuImage::new(desc, slot))?;
        Ok(handle)
    }

    /// Create a sampler and expose it through a bindless sampler index
    pub fn create_sampler(&self, desc: GpuSamplerDesc) -> Result<Handle<GpuSampler>> {
        desc.validate()?;
        let handle = Handle::<GpuSampler>::new(self.config.pool_ids.samplers)?;
        let slot = self.assign(&desc.descriptor())?;
        install(&handle, GpuSampler::new(desc, slot))?;
        Ok(handle)
    }

    /// Create a material holding its images and sampler
    ///
    /// The material takes over the handles in `desc`.
    pub fn create_material(&self, desc: MaterialDesc) -> Result<Handle<Material>> {
        desc.validate()?;
        let handle = Handle::<Material>::new(self.config.pool_ids.materials)?;
        let slot = self.assign(&desc.descriptor())?;
        install(&handle, Material::new(desc, slot))?;
        Ok(handle)
    }

    // ===== UPDATES =====

    /// Point an image at a new image view
    ///
    /// Its bindless index changes: read it again with
    /// [`GpuImage::bindless_index`] and refresh anything that cached it.
    pub fn update_image_view(&self, image: &Handle<GpuImage>, image_view: u64) -> Result<()> {
        let mut value = image.get_mut().ok_or_else(|| {
            invalid_resource("bpool::ResourceManager", format!("{:?} is not live", image))
        })?;
        value.replace_view(image_view)
    }

    /// Shader-facing indices of a material
    pub fn material_gpu_data(&self, material: &Handle<Material>) -> Result<MaterialGpuData> {
        material.get().map(|value| value.gpu_data()).ok_or_else(|| {
            invalid_resource("bpool::ResourceManager", format!("{:?} is not live", material))
        })
    }

    // ===== FRAMES =====

    /// Start the next frame; see [`BindlessTable::advance_frame`]
    pub fn advance_frame(&self) -> u64 {
        self.bindless.advance_frame()
    }

    /// Reclaim bindless indices released at or before a completed frame
    pub fn retire_completed(&self, frame: u64) -> u32 {
        self.bindless.retire_completed(frame)
    }

    // ===== ACCESS =====

    pub fn bindless(&self) -> &Arc<BindlessTable> {
        &self.bindless
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn stats(&self) -> Result<ResourceStats> {
        let ids = self.config.pool_ids;
        let used = |id: PoolId| -> Result<u32> {
            Ok(self.registry.pool_erased(id)?.used_slot_count())
        };
        Ok(ResourceStats {
            buffers: used(ids.buffers)?,
            images: used(ids.images)?,
            samplers: used(ids.samplers)?,
            materials: used(ids.materials)?,
            pending_bindless: BindlessKind::ALL
                .iter()
                .map(|kind| self.bindless.pending_count(*kind))
                .sum(),
        })
    }

    fn assign(&self, resource: &DescriptorResource) -> Result<BindlessSlot> {
        let index = self.bindless.assign(resource)?;
        Ok(BindlessSlot::new(self.bindless.clone(), index))
    }
}

fn register<T: Poolable>(registry: &Registry, id: PoolId, capacity: u32, label: &str) -> Result<()> {
    registry.register_pool(id, Arc::new(ResourcePool::<T>::new(capacity, label)))?;
    engine_debug!("bpool::ResourceManager", "Pool '{}' ({} slots) at id {}", label, capacity, id.get());
    Ok(())
}

/// Move a fully built value into the slot behind a freshly created handle
fn install<T: Poolable>(handle: &Handle<T>, mut value: T) -> Result<()> {
    match handle.get_mut() {
        Some(mut slot) => {
            *slot = value;
            Ok(())
        }
        None => {
            value.finalize();
            Err(invalid_resource(
                "bpool::ResourceManager",
                format!("{:?} died during creation", handle),
            ))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
