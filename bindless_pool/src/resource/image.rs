/// Pooled GPU image view with a bindless sampled-image descriptor

use crate::bindless::{BindlessIndex, DescriptorResource};
use crate::error::Result;
use crate::pool::Finalize;
use crate::resource::{invalid_resource, BindlessSlot};

/// Image creation descriptor
#[derive(Debug, Clone)]
pub struct GpuImageDesc {
    pub name: String,
    /// Raw backend image view handle
    pub image_view: u64,
    pub width: u32,
    pub height: u32,
}

impl GpuImageDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.image_view == 0 {
            return Err(invalid_resource("bpool::GpuImage",
                format!("Image '{}': null image view", self.name)));
        }
        if self.width == 0 || self.height == 0 {
            return Err(invalid_resource("bpool::GpuImage",
                format!("Image '{}': invalid extent {}x{}", self.name, self.width, self.height)));
        }
        Ok(())
    }

    pub(crate) fn descriptor(&self) -> DescriptorResource {
        DescriptorResource::SampledImage { image_view: self.image_view }
    }
}

/// Image stored in the image pool
#[derive(Debug, Default)]
pub struct GpuImage {
    name: String,
    image_view: u64,
    width: u32,
    height: u32,
    bindless: Option<BindlessSlot>,
}

impl GpuImage {
    pub(crate) fn new(desc: GpuImageDesc, bindless: BindlessSlot) -> Self {
        Self {
            name: desc.name,
            image_view: desc.image_view,
            width: desc.width,
            height: desc.height,
            bindless: Some(bindless),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_view(&self) -> u64 {
        self.image_view
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bindless_index(&self) -> Option<BindlessIndex> {
        self.bindless.as_ref().map(BindlessSlot::index)
    }

    /// Swap the image view (e.g. after streaming in mips)
    ///
    /// The image moves to a new bindless index; the old one is quarantined
    /// while recorded frames may still sample the old view.
    pub(crate) fn replace_view(&mut self, image_view: u64) -> Result<()> {
        if image_view == 0 {
            return Err(invalid_resource("bpool::GpuImage",
                format!("Image '{}': null image view", self.name)));
        }
        if let Some(slot) = &mut self.bindless {
            slot.replace(&DescriptorResource::SampledImage { image_view })?;
        }
        self.image_view = image_view;
        Ok(())
    }
}

impl Finalize for GpuImage {
    fn finalize(&mut self) {
        if let Some(slot) = self.bindless.take() {
            slot.release();
        }
    }
}
