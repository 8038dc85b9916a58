/// Pooled sampler with a bindless sampler descriptor

use crate::bindless::{BindlessIndex, DescriptorResource};
use crate::error::Result;
use crate::pool::Finalize;
use crate::resource::{invalid_resource, BindlessSlot};

#[derive(Debug, Clone)]
pub struct GpuSamplerDesc {
    pub name: String,
    /// Raw backend sampler handle
    pub sampler: u64,
}

impl GpuSamplerDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.sampler == 0 {
            return Err(invalid_resource("bpool::GpuSampler",
                format!("Sampler '{}': null backend handle", self.name)));
        }
        Ok(())
    }

    pub(crate) fn descriptor(&self) -> DescriptorResource {
        DescriptorResource::Sampler { sampler: self.sampler }
    }
}

#[derive(Debug, Default)]
pub struct GpuSampler {
    name: String,
    sampler: u64,
    bindless: Option<BindlessSlot>,
}

impl GpuSampler {
    pub(crate) fn new(desc: GpuSamplerDesc, bindless: BindlessSlot) -> Self {
        Self { name: desc.name, sampler: desc.sampler, bindless: Some(bindless) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_sampler(&self) -> u64 {
        self.sampler
    }

    pub fn bindless_index(&self) -> Option<BindlessIndex> {
        self.bindless.as_ref().map(BindlessSlot::index)
    }
}

impl Finalize for GpuSampler {
    fn finalize(&mut self) {
        if let Some(slot) = self.bindless.take() {
            slot.release();
        }
    }
}
