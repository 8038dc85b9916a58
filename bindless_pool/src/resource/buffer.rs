/// Pooled GPU buffer with a bindless storage-buffer descriptor

use crate::bindless::{BindlessIndex, DescriptorResource};
use crate::error::Result;
use crate::pool::Finalize;
use crate::resource::{invalid_resource, BindlessSlot};

/// Buffer creation descriptor
///
/// `buffer` is the backend handle as a raw `u64`; the buffer itself is
/// created and destroyed by the backend.
#[derive(Debug, Clone)]
pub struct GpuBufferDesc {
    pub name: String,
    pub buffer: u64,
    pub size: u64,
}

impl GpuBufferDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.buffer == 0 {
            return Err(invalid_resource("bpool::GpuBuffer",
                format!("Buffer '{}': null backend handle", self.name)));
        }
        if self.size == 0 {
            return Err(invalid_resource("bpool::GpuBuffer",
                format!("Buffer '{}': size must be greater than 0", self.name)));
        }
        Ok(())
    }

    pub(crate) fn descriptor(&self) -> DescriptorResource {
        DescriptorResource::Buffer { buffer: self.buffer, offset: 0, range: self.size }
    }
}

/// Buffer stored in the buffer pool
#[derive(Debug, Default)]
pub struct GpuBuffer {
    name: String,
    buffer: u64,
    size: u64,
    bindless: Option<BindlessSlot>,
}

impl GpuBuffer {
    pub(crate) fn new(desc: GpuBufferDesc, bindless: BindlessSlot) -> Self {
        Self { name: desc.name, buffer: desc.buffer, size: desc.size, bindless: Some(bindless) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw backend handle
    pub fn raw_buffer(&self) -> u64 {
        self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Index shaders use to reach this buffer
    pub fn bindless_index(&self) -> Option<BindlessIndex> {
        self.bindless.as_ref().map(BindlessSlot::index)
    }
}

impl Finalize for GpuBuffer {
    fn finalize(&mut self) {
        if let Some(slot) = self.bindless.take() {
            slot.release();
        }
    }
}
