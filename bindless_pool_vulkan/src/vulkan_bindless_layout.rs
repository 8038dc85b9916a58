/// BindlessLayout - the bindless descriptor set layout and its per-frame sets
///
/// One descriptor set layout with four arrays, one per bindless kind:
///
/// | binding | kind          | descriptor type |
/// |---------|---------------|-----------------|
/// | 0       | buffer        | STORAGE_BUFFER  |
/// | 1       | sampled image | SAMPLED_IMAGE   |
/// | 2       | sampler       | SAMPLER         |
/// | 3       | material data | STORAGE_BUFFER  |
///
/// Every binding is `PARTIALLY_BOUND | UPDATE_AFTER_BIND |
/// UPDATE_UNUSED_WHILE_PENDING`, so unwritten indices are legal and an index
/// can be written while a submitted command buffer that does not use it is
/// still pending. The device must enable these descriptor indexing features
/// (Vulkan 1.2 core):
///
/// - `descriptorBindingPartiallyBound`
/// - `descriptorBindingUpdateUnusedWhilePending`
/// - `descriptorBindingStorageBufferUpdateAfterBind`
/// - `descriptorBindingSampledImageUpdateAfterBind`
/// - `runtimeDescriptorArray`

use bindless_pool::bpool::{BindlessKind, PoolConfig, Result};
use bindless_pool::{engine_debug, engine_err};
use ash::vk;

/// Shader stages that can read bindless arrays
const BINDLESS_STAGES: vk::ShaderStageFlags = vk::ShaderStageFlags::ALL;

/// Descriptor type backing a bindless kind
pub(crate) fn descriptor_type(kind: BindlessKind) -> vk::DescriptorType {
    match kind {
        BindlessKind::Buffer | BindlessKind::MaterialData => vk::DescriptorType::STORAGE_BUFFER,
        BindlessKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        BindlessKind::Sampler => vk::DescriptorType::SAMPLER,
    }
}

/// Binding number of a bindless kind's array
pub(crate) fn binding(kind: BindlessKind) -> u32 {
    kind.slot() as u32
}

/// Binding flags shared by every bindless array
pub(crate) const BINDLESS_BINDING_FLAGS: vk::DescriptorBindingFlags = vk::DescriptorBindingFlags::from_raw(
    vk::DescriptorBindingFlags::PARTIALLY_BOUND.as_raw()
        | vk::DescriptorBindingFlags::UPDATE_AFTER_BIND.as_raw()
        | vk::DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING.as_raw(),
);

/// Layout bindings, indexed by binding number
pub(crate) fn layout_bindings(config: &PoolConfig) -> [vk::DescriptorSetLayoutBinding<'static>; 4] {
    BindlessKind::ALL.map(|kind| {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding(kind))
            .descriptor_type(descriptor_type(kind))
            .descriptor_count(config.bindless_capacity(kind))
            .stage_flags(BINDLESS_STAGES)
    })
}

/// Pool sizes for `frames_in_flight` copies of the layout
///
/// Kinds sharing a descriptor type are summed into one entry.
pub(crate) fn pool_sizes(config: &PoolConfig) -> Vec<vk::DescriptorPoolSize> {
    let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::with_capacity(3);
    for kind in BindlessKind::ALL {
        let ty = descriptor_type(kind);
        let count = config.bindless_capacity(kind) * config.frames_in_flight;
        match sizes.iter_mut().find(|size| size.ty == ty) {
            Some(size) => size.descriptor_count += count,
            None => sizes.push(vk::DescriptorPoolSize { ty, descriptor_count: count }),
        }
    }
    sizes
}

/// Bindless set layout, its descriptor pool and one set per frame in flight
pub struct BindlessLayout {
    device: ash::Device,
    set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets: Vec<vk::DescriptorSet>,
}

impl BindlessLayout {
    /// Create the layout and allocate `config.frames_in_flight` sets
    ///
    /// `config` must be the configuration later given to the resource
    /// manager, so array sizes match the bindless table capacities.
    pub fn new(device: &ash::Device, config: &PoolConfig) -> Result<Self> {
        config.validate()?;

        let bindings = layout_bindings(config);
        let binding_flags = [BINDLESS_BINDING_FLAGS; 4];
        let mut flags_info = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default()
            .binding_flags(&binding_flags);
        let layout_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL)
            .bindings(&bindings)
            .push_next(&mut flags_info);

        unsafe {
            let set_layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| engine_err!("bpool::vulkan",
                    "Failed to create bindless descriptor set layout: {:?}", e))?;

            let sizes = pool_sizes(config);
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .flags(vk::DescriptorPoolCreateFlags::UPDATE_AFTER_BIND)
                .pool_sizes(&sizes)
                .max_sets(config.frames_in_flight);

            let descriptor_pool = match device.create_descriptor_pool(&pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_descriptor_set_layout(set_layout, None);
                    return Err(engine_err!("bpool::vulkan",
                        "Failed to create bindless descriptor pool: {:?}", e));
                }
            };

            let layouts = vec![set_layout; config.frames_in_flight as usize];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&layouts);

            let descriptor_sets = match device.allocate_descriptor_sets(&allocate_info) {
                Ok(sets) => sets,
                Err(e) => {
                    device.destroy_descriptor_pool(descriptor_pool, None);
                    device.destroy_descriptor_set_layout(set_layout, None);
                    return Err(engine_err!("bpool::vulkan",
                        "Failed to allocate bindless descriptor sets: {:?}", e));
                }
            };

            engine_debug!("bpool::vulkan",
                "Bindless layout created: {} buffers, {} images, {} samplers, {} material blocks, {} sets",
                config.max_buffers, config.max_images, config.max_samplers,
                config.max_material_data, descriptor_sets.len());

            Ok(Self {
                device: device.clone(),
                set_layout,
                descriptor_pool,
                descriptor_sets,
            })
        }
    }

    /// Layout to include in pipeline layouts
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout
    }

    /// Set to bind while recording frame slot `frame_slot`
    pub fn descriptor_set(&self, frame_slot: u32) -> Option<vk::DescriptorSet> {
        self.descriptor_sets.get(frame_slot as usize).copied()
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.descriptor_sets.len() as u32
    }

    pub(crate) fn device(&self) -> &ash::Device {
        &self.device
    }
}

impl Drop for BindlessLayout {
    fn drop(&mut self) {
        unsafe {
            // Sets are freed with their pool
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}
