//! Bindless descriptor index management

mod bindless_table;
mod descriptor;

#[cfg(test)]
pub(crate) mod mock_descriptor_writer;

pub use bindless_table::{BindlessState, BindlessTable};
pub use descriptor::{BindlessIndex, BindlessKind, DescriptorResource, DescriptorWriter};
