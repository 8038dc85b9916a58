/// Registry - write-once tables of pools and memory allocators

use std::sync::{Arc, OnceLock};

use crate::engine_debug;
use crate::error::{Error, Result};
use crate::log::log_error;
use crate::pool::{ErasedPool, Poolable, ResourcePool};
use crate::registry::MemoryAllocator;

/// Number of entries in the pool table (ids are `u8`)
pub const MAX_POOLS: usize = 256;

/// Number of entries in the allocator table (ids are `u8`)
pub const MAX_ALLOCATORS: usize = 256;

/// Identifies a pool in the registry
///
/// `0` is reserved and never resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u8);

impl PoolId {
    /// The reserved null id
    pub const NULL: PoolId = PoolId(0);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Identifies a memory allocator in the registry
///
/// `0` is reserved and never resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(u8);

impl AllocatorId {
    pub const NULL: AllocatorId = AllocatorId(0);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Maps small integer ids to type-erased pools and to memory allocators
///
/// Every entry is a write-once cell: once registered, a pool stays for the
/// lifetime of the registry and lookups never take a lock. The engine owns
/// the process-wide instance (see `Engine::registry()`); tests may build
/// their own.
pub struct Registry {
    pools: Box<[OnceLock<Arc<dyn ErasedPool>>]>,
    allocators: Box<[OnceLock<Arc<MemoryAllocator>>]>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            pools: (0..MAX_POOLS).map(|_| OnceLock::new()).collect(),
            allocators: (0..MAX_ALLOCATORS).map(|_| OnceLock::new()).collect(),
        }
    }

    // ===== POOLS =====

    /// Register `pool` under `id`
    ///
    /// # Errors
    ///
    /// - `InvalidPoolId` for id 0
    /// - `PoolAlreadyRegistered` if the id is taken
    pub fn register_pool<T: Poolable>(&self, id: PoolId, pool: Arc<ResourcePool<T>>) -> Result<()> {
        if id.is_null() {
            return Err(log_error("bpool::Registry", Error::InvalidPoolId));
        }

        let label = pool.label().to_string();
        let erased: Arc<dyn ErasedPool> = pool;
        self.pools[id.get() as usize]
            .set(erased)
            .map_err(|_| log_error("bpool::Registry", Error::PoolAlreadyRegistered(id.get())))?;

        engine_debug!("bpool::Registry", "Pool {} registered: '{}' ({})",
            id.get(), label, std::any::type_name::<T>());
        Ok(())
    }

    /// Typed lookup
    ///
    /// # Errors
    ///
    /// - `InvalidPoolId` for id 0
    /// - `PoolNotRegistered` if the id is empty
    /// - `PoolTypeMismatch` if the pool stores another element type
    pub fn pool<T: Poolable>(&self, id: PoolId) -> Result<&ResourcePool<T>> {
        let erased = self.pool_erased(id)?;
        erased.as_any().downcast_ref::<ResourcePool<T>>().ok_or_else(|| {
            log_error(
                "bpool::Registry",
                Error::PoolTypeMismatch {
                    id: id.get(),
                    expected: std::any::type_name::<T>(),
                    found: erased.element_type_name(),
                },
            )
        })
    }

    /// Untyped lookup, for diagnostics
    pub fn pool_erased(&self, id: PoolId) -> Result<&dyn ErasedPool> {
        if id.is_null() {
            return Err(log_error("bpool::Registry", Error::InvalidPoolId));
        }
        self.pools[id.get() as usize]
            .get()
            .map(|pool| pool.as_ref())
            .ok_or_else(|| log_error("bpool::Registry", Error::PoolNotRegistered(id.get())))
    }

    /// Whether a pool sits under `id`
    pub fn is_pool_registered(&self, id: PoolId) -> bool {
        !id.is_null() && self.pools[id.get() as usize].get().is_some()
    }

    /// Ids of every registered pool, ascending
    pub fn registered_pool_ids(&self) -> Vec<PoolId> {
        self.pools
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(id, _)| PoolId::new(id as u8))
            .collect()
    }

    // ===== ALLOCATORS =====

    /// Register `allocator` under `id`
    ///
    /// # Errors
    ///
    /// - `InvalidAllocatorId` for id 0
    /// - `AllocatorAlreadyRegistered` if the id is taken
    pub fn register_allocator(&self, id: AllocatorId, allocator: MemoryAllocator) -> Result<()> {
        if id.is_null() {
            return Err(log_error("bpool::Registry", Error::InvalidAllocatorId));
        }

        let kind = allocator.kind_name();
        self.allocators[id.get() as usize]
            .set(Arc::new(allocator))
            .map_err(|_| log_error("bpool::Registry", Error::AllocatorAlreadyRegistered(id.get())))?;

        engine_debug!("bpool::Registry", "Allocator {} registered ({})", id.get(), kind);
        Ok(())
    }

    /// Shared reference to the allocator under `id`
    ///
    /// # Errors
    ///
    /// - `InvalidAllocatorId` for id 0
    /// - `AllocatorNotRegistered` if the id is empty
    pub fn allocator(&self, id: AllocatorId) -> Result<Arc<MemoryAllocator>> {
        if id.is_null() {
            return Err(log_error("bpool::Registry", Error::InvalidAllocatorId));
        }
        self.allocators[id.get() as usize]
            .get()
            .cloned()
            .ok_or_else(|| log_error("bpool::Registry", Error::AllocatorNotRegistered(id.get())))
    }

    /// Ids of every registered allocator, ascending
    pub fn registered_allocator_ids(&self) -> Vec<AllocatorId> {
        self.allocators
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(id, _)| AllocatorId::new(id as u8))
            .collect()
    }

    // ===== CONVENIENCE =====

    /// Build a pool charged to a registered allocator and register it
    ///
    /// # Errors
    ///
    /// Any failure of [`allocator`](Self::allocator),
    /// [`ResourcePool::with_allocator`] or [`register_pool`](Self::register_pool).
    pub fn create_pool<T: Poolable>(
        &self,
        id: PoolId,
        capacity: u32,
        label: &str,
        allocator_id: AllocatorId,
    ) -> Result<&ResourcePool<T>> {
        let allocator = self.allocator(allocator_id)?;
        let pool = ResourcePool::<T>::with_allocator(capacity, label, allocator)?;
        self.register_pool(id, Arc::new(pool))?;
        self.pool::<T>(id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
