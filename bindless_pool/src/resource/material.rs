/// Pooled material: shared image/sampler handles plus a bindless parameter block
///
/// A material owns one reference to each image and to the sampler it uses,
/// so those stay alive (and keep their bindless indices) for as long as the
/// material does. Its own parameter block lives in a buffer range exposed to
/// shaders through a `MaterialData` bindless index.

use bytemuck::{Pod, Zeroable};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::bindless::{BindlessIndex, DescriptorResource};
use crate::error::Result;
use crate::pool::{Finalize, Handle};
use crate::resource::{invalid_resource, BindlessSlot, GpuImage, GpuSampler};

/// Most texture slots a material can have
pub const MAX_MATERIAL_TEXTURES: usize = 8;

/// Marks an unused entry of [`MaterialGpuData::texture_indices`]
pub const NO_BINDLESS_INDEX: u32 = u32::MAX;

// ===== DESCRIPTORS =====

/// Named texture slot of a material
pub struct MaterialTextureDesc {
    pub name: String,
    pub image: Handle<GpuImage>,
}

/// Buffer range holding the material parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialDataRange {
    pub buffer: u64,
    pub offset: u64,
    pub range: u64,
}

/// Material creation descriptor
pub struct MaterialDesc {
    pub name: String,
    pub textures: Vec<MaterialTextureDesc>,
    pub sampler: Handle<GpuSampler>,
    pub data: MaterialDataRange,
}

impl MaterialDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        // ========== VALIDATION 1: Texture slot count ==========
        if self.textures.len() > MAX_MATERIAL_TEXTURES {
            return Err(invalid_resource("bpool::Material", format!(
                "Material '{}': {} texture slots, at most {} supported",
                self.name, self.textures.len(), MAX_MATERIAL_TEXTURES
            )));
        }

        // ========== VALIDATION 2: No duplicate or dead texture slots ==========
        let mut seen_names = FxHashSet::default();
        for slot in &self.textures {
            if !seen_names.insert(slot.name.as_str()) {
                return Err(invalid_resource("bpool::Material",
                    format!("Material '{}': duplicate texture slot '{}'", self.name, slot.name)));
            }
            if !slot.image.is_valid() {
                return Err(invalid_resource("bpool::Material",
                    format!("Material '{}': texture slot '{}' has a dead image handle", self.name, slot.name)));
            }
        }

        // ========== VALIDATION 3: Sampler and parameter block ==========
        if !self.sampler.is_valid() {
            return Err(invalid_resource("bpool::Material",
                format!("Material '{}': dead sampler handle", self.name)));
        }
        if self.data.buffer == 0 || self.data.range == 0 {
            return Err(invalid_resource("bpool::Material",
                format!("Material '{}': empty parameter block", self.name)));
        }
        Ok(())
    }

    pub(crate) fn descriptor(&self) -> DescriptorResource {
        DescriptorResource::MaterialData {
            buffer: self.data.buffer,
            offset: self.data.offset,
            range: self.data.range,
        }
    }
}

// ===== GPU VIEW =====

/// Bindless indices a shader needs to sample a material
///
/// Laid out for direct upload (`bytemuck::bytes_of`) into the material's
/// parameter block or a per-draw buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MaterialGpuData {
    pub data_index: u32,
    pub sampler_index: u32,
    pub texture_count: u32,
    pub _pad: u32,
    pub texture_indices: [u32; MAX_MATERIAL_TEXTURES],
}

// ===== MATERIAL =====

struct MaterialTexture {
    name: String,
    image: Handle<GpuImage>,
}

/// Material stored in the material pool
#[derive(Default)]
pub struct Material {
    name: String,
    textures: Vec<MaterialTexture>,
    texture_names: FxHashMap<String, usize>,
    sampler: Handle<GpuSampler>,
    data: MaterialDataRange,
    bindless: Option<BindlessSlot>,
}

impl Material {
    pub(crate) fn new(desc: MaterialDesc, bindless: BindlessSlot) -> Self {
        let mut textures = Vec::with_capacity(desc.textures.len());
        let mut texture_names = FxHashMap::default();

        for (vec_index, slot) in desc.textures.into_iter().enumerate() {
            texture_names.insert(slot.name.clone(), vec_index);
            textures.push(MaterialTexture { name: slot.name, image: slot.image });
        }

        Self {
            name: desc.name,
            textures,
            texture_names,
            sampler: desc.sampler,
            data: desc.data,
            bindless: Some(bindless),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== TEXTURE ACCESS =====

    /// Image bound to the slot called `name`
    pub fn texture(&self, name: &str) -> Option<&Handle<GpuImage>> {
        let idx = self.texture_names.get(name)?;
        self.textures.get(*idx).map(|slot| &slot.image)
    }

    /// Slot name and image at `index`
    pub fn texture_at(&self, index: usize) -> Option<(&str, &Handle<GpuImage>)> {
        self.textures.get(index).map(|slot| (slot.name.as_str(), &slot.image))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== OTHER ACCESS =====

    pub fn sampler(&self) -> &Handle<GpuSampler> {
        &self.sampler
    }

    pub fn data_range(&self) -> MaterialDataRange {
        self.data
    }

    pub fn bindless_index(&self) -> Option<BindlessIndex> {
        self.bindless.as_ref().map(BindlessSlot::index)
    }

    /// Resolve the bindless indices of everything the material references
    ///
    /// Images or a sampler without an index show up as `NO_BINDLESS_INDEX`.
    pub fn gpu_data(&self) -> MaterialGpuData {
        let index_of = |index: Option<BindlessIndex>| index.map_or(NO_BINDLESS_INDEX, |i| i.index);

        let mut texture_indices = [NO_BINDLESS_INDEX; MAX_MATERIAL_TEXTURES];
        for (entry, slot) in texture_indices.iter_mut().zip(&self.textures) {
            *entry = index_of(slot.image.get().and_then(|image| image.bindless_index()));
        }

        MaterialGpuData {
            data_index: index_of(self.bindless_index()),
            sampler_index: index_of(self.sampler.get().and_then(|sampler| sampler.bindless_index())),
            texture_count: self.textures.len() as u32,
            _pad: 0,
            texture_indices,
        }
    }
}

impl Finalize for Material {
    fn finalize(&mut self) {
        if let Some(slot) = self.bindless.take() {
            slot.release();
        }
        // Drop the shared references now rather than with the value
        self.textures.clear();
        self.texture_names.clear();
        self.sampler = Handle::null();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
