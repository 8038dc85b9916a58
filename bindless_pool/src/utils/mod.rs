//! Small building blocks shared by pools and the bindless table

mod index_allocator;

pub use index_allocator::IndexAllocator;
