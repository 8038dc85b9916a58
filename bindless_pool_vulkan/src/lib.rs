/*!
# Bindless Pool - Vulkan Backend

Vulkan implementation of the bindless descriptor writer, using the Ash
library for Vulkan bindings.

The application owns the device. It builds a [`BindlessLayout`] from the same
`PoolConfig` it gives the resource manager, includes
[`BindlessLayout::set_layout`] in its pipeline layouts, and binds
[`BindlessLayout::descriptor_set`] for the frame slot being recorded.

# Example

```no_run
use bindless_pool::bpool::{Engine, PoolConfig, ResourceManagerDesc};
use bindless_pool_vulkan::{BindlessLayout, VulkanDescriptorWriter};
use std::sync::Arc;

# fn setup(device: &ash::Device) -> bindless_pool::bpool::Result<()> {
let config = PoolConfig::default();
let layout = Arc::new(BindlessLayout::new(device, &config)?);

Engine::initialize()?;
Engine::create_resource_manager(ResourceManagerDesc {
    config,
    writer: Box::new(VulkanDescriptorWriter::new(layout.clone())),
})?;
# Ok(())
# }
```
*/

mod vulkan_bindless_layout;
mod vulkan_descriptor_writer;

pub use vulkan_bindless_layout::BindlessLayout;
pub use vulkan_descriptor_writer::VulkanDescriptorWriter;
