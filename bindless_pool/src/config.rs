/// Capacity and frame configuration

use crate::bindless::BindlessKind;
use crate::error::{Error, Result};
use crate::log::log_error;
use crate::registry::PoolId;

/// Largest supported number of frames in flight
pub const MAX_FRAMES_IN_FLIGHT: u32 = 8;

/// Registry ids of the pools owned by the resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolIds {
    pub buffers: PoolId,
    pub images: PoolId,
    pub samplers: PoolId,
    pub materials: PoolId,
}

impl PoolIds {
    pub fn all(&self) -> [PoolId; 4] {
        [self.buffers, self.images, self.samplers, self.materials]
    }
}

impl Default for PoolIds {
    fn default() -> Self {
        Self {
            buffers: PoolId::new(1),
            images: PoolId::new(2),
            samplers: PoolId::new(3),
            materials: PoolId::new(4),
        }
    }
}

/// Pool and bindless table configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Buffer pool slots and bindless buffer descriptors
    pub max_buffers: u32,
    /// Image pool slots and bindless sampled-image descriptors
    pub max_images: u32,
    /// Sampler pool slots and bindless sampler descriptors
    pub max_samplers: u32,
    /// Bindless material parameter blocks
    pub max_material_data: u32,
    /// Material pool slots
    pub max_materials: u32,
    /// Frames the GPU may have in flight (F)
    pub frames_in_flight: u32,
    /// Where the resource manager registers its pools
    pub pool_ids: PoolIds,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_buffers: 4096,
            max_images: 4096,
            max_samplers: 256,
            max_material_data: 1024,
            max_materials: 1024,
            frames_in_flight: 2,
            pool_ids: PoolIds::default(),
        }
    }
}

impl PoolConfig {
    /// Check the configuration before anything is created from it
    ///
    /// # Errors
    ///
    /// `InitializationFailed` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 || self.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(invalid(format!(
                "frames_in_flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }

        for (name, value) in [
            ("max_buffers", self.max_buffers),
            ("max_images", self.max_images),
            ("max_samplers", self.max_samplers),
            ("max_material_data", self.max_material_data),
            ("max_materials", self.max_materials),
        ] {
            if value == 0 {
                return Err(invalid(format!("{} must be greater than 0", name)));
            }
        }

        let ids = self.pool_ids.all();
        if ids.iter().any(|id| id.is_null()) {
            return Err(invalid("pool ids must not be 0".to_string()));
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[i + 1..].contains(id) {
                return Err(invalid(format!("pool id {} used twice", id.get())));
            }
        }

        Ok(())
    }

    /// Descriptor array size of a bindless kind
    pub fn bindless_capacity(&self, kind: BindlessKind) -> u32 {
        match kind {
            BindlessKind::Buffer => self.max_buffers,
            BindlessKind::SampledImage => self.max_images,
            BindlessKind::Sampler => self.max_samplers,
            BindlessKind::MaterialData => self.max_material_data,
        }
    }
}

#[track_caller]
fn invalid(message: String) -> Error {
    log_error("bpool::PoolConfig", Error::InitializationFailed(message))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
