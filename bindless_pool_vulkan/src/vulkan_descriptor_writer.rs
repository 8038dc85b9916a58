/// VulkanDescriptorWriter - copies bindless descriptors into the per-frame sets

use bindless_pool::bpool::{DescriptorResource, DescriptorWriter, Result};
use bindless_pool::engine_bail;
use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use crate::vulkan_bindless_layout::{binding, descriptor_type, BindlessLayout};

/// Vulkan payload of one descriptor write
#[derive(Debug, Clone, Copy)]
pub(crate) enum DescriptorInfo {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}

/// Convert raw backend handles into the info struct Vulkan expects
pub(crate) fn descriptor_info(resource: &DescriptorResource) -> DescriptorInfo {
    match *resource {
        DescriptorResource::Buffer { buffer, offset, range }
        | DescriptorResource::MaterialData { buffer, offset, range } => DescriptorInfo::Buffer(
            vk::DescriptorBufferInfo::default()
                .buffer(vk::Buffer::from_raw(buffer))
                .offset(offset)
                .range(range),
        ),
        DescriptorResource::SampledImage { image_view } => DescriptorInfo::Image(
            vk::DescriptorImageInfo::default()
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .image_view(vk::ImageView::from_raw(image_view)),
        ),
        DescriptorResource::Sampler { sampler } => DescriptorInfo::Image(
            vk::DescriptorImageInfo::default().sampler(vk::Sampler::from_raw(sampler)),
        ),
    }
}

/// DescriptorWriter backed by a [`BindlessLayout`]
///
/// Holds the layout alive: its sets must outlive every write.
pub struct VulkanDescriptorWriter {
    layout: Arc<BindlessLayout>,
}

impl VulkanDescriptorWriter {
    pub fn new(layout: Arc<BindlessLayout>) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Arc<BindlessLayout> {
        &self.layout
    }
}

impl DescriptorWriter for VulkanDescriptorWriter {
    fn write_descriptor(&mut self, frame_slot: u32, index: u32, resource: &DescriptorResource) -> Result<()> {
        let Some(descriptor_set) = self.layout.descriptor_set(frame_slot) else {
            engine_bail!("bpool::vulkan",
                "write_descriptor: frame slot {} out of range ({} sets)",
                frame_slot, self.layout.frames_in_flight());
        };

        let kind = resource.kind();
        let write = vk::WriteDescriptorSet::default()
            .dst_set(descriptor_set)
            .dst_binding(binding(kind))
            .dst_array_element(index)
            .descriptor_type(descriptor_type(kind));

        // Update-after-bind sets may be written while other frames use them
        let info = descriptor_info(resource);
        unsafe {
            match &info {
                DescriptorInfo::Buffer(buffer_info) => self.layout.device().update_descriptor_sets(
                    &[write.buffer_info(std::slice::from_ref(buffer_info))],
                    &[],
                ),
                DescriptorInfo::Image(image_info) => self.layout.device().update_descriptor_sets(
                    &[write.image_info(std::slice::from_ref(image_info))],
                    &[],
                ),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;
