/// Bindless descriptor kinds, indices and the backend write interface

use std::fmt;

use crate::error::Result;

/// Descriptor array a bindless index lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindlessKind {
    /// Storage buffer
    Buffer,
    /// Sampled image view
    SampledImage,
    /// Sampler object
    Sampler,
    /// Per-material parameter block (a buffer range)
    MaterialData,
}

impl BindlessKind {
    /// Every kind, in table order
    pub const ALL: [BindlessKind; 4] = [
        BindlessKind::Buffer,
        BindlessKind::SampledImage,
        BindlessKind::Sampler,
        BindlessKind::MaterialData,
    ];

    /// Position of this kind in per-kind arrays (also its binding number)
    pub const fn slot(self) -> usize {
        match self {
            BindlessKind::Buffer => 0,
            BindlessKind::SampledImage => 1,
            BindlessKind::Sampler => 2,
            BindlessKind::MaterialData => 3,
        }
    }
}

impl fmt::Display for BindlessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindlessKind::Buffer => "buffer",
            BindlessKind::SampledImage => "sampled image",
            BindlessKind::Sampler => "sampler",
            BindlessKind::MaterialData => "material data",
        };
        f.write_str(name)
    }
}

/// Slot in one of the bindless descriptor arrays
///
/// Numerically unrelated to any pool slot index. Shaders receive `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindlessIndex {
    pub kind: BindlessKind,
    pub index: u32,
}

impl BindlessIndex {
    pub const fn new(kind: BindlessKind, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for BindlessIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// Backend object a descriptor points at
///
/// Handles are raw `u64` values so the core stays backend agnostic (for
/// Vulkan, `vk::Handle::as_raw()` of the buffer / image view / sampler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    Buffer {
        buffer: u64,
        offset: u64,
        range: u64,
    },
    SampledImage {
        image_view: u64,
    },
    Sampler {
        sampler: u64,
    },
    MaterialData {
        buffer: u64,
        offset: u64,
        range: u64,
    },
}

impl DescriptorResource {
    pub fn kind(&self) -> BindlessKind {
        match self {
            DescriptorResource::Buffer { .. } => BindlessKind::Buffer,
            DescriptorResource::SampledImage { .. } => BindlessKind::SampledImage,
            DescriptorResource::Sampler { .. } => BindlessKind::Sampler,
            DescriptorResource::MaterialData { .. } => BindlessKind::MaterialData,
        }
    }
}

/// Writes one descriptor into one frame-local descriptor set
///
/// Implemented by the GPU backend. The bindless table calls it once per
/// frame slot (`0..frames_in_flight`) for every assignment, always from
/// behind its own lock, so implementations need no synchronization.
pub trait DescriptorWriter: Send {
    /// Write `resource` at array element `index` of its kind's binding in
    /// the descriptor set of `frame_slot`
    fn write_descriptor(
        &mut self,
        frame_slot: u32,
        index: u32,
        resource: &DescriptorResource,
    ) -> Result<()>;
}
