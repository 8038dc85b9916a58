//! Generation-counted, reference-counted object pools

mod finalize;
mod handle;
mod resource_pool;

pub use finalize::{Finalize, Poolable};
pub use handle::{Handle, RawHandle};
pub use resource_pool::{ErasedPool, ResourcePool};
