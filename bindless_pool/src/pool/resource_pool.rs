/// ResourcePool - fixed-capacity, generation-checked, reference-counted storage

use std::any::Any;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};

use crate::error::{Error, Result};
use crate::log::log_error;
use crate::pool::Poolable;
use crate::registry::MemoryAllocator;
use crate::utils::IndexAllocator;
use crate::{engine_trace, engine_warn};

/// Ownership bookkeeping of one slot, kept apart from the value
///
/// A slot is live exactly while `ref_count > 0`.
#[derive(Debug, Clone, Copy, Default)]
struct SlotMeta {
    ref_count: u32,
    generation: u16,
}

impl SlotMeta {
    fn is_live(&self) -> bool {
        self.ref_count > 0
    }
}

/// Fixed-capacity pool of `T` addressed by `(index, generation)` pairs
///
/// - Storage for every slot is created up front; there is no growth path.
/// - A slot's generation only advances when the slot is freed, so any pair
///   captured before the free stops resolving.
/// - The reference count starts at 1 on `allocate()`; when it drops back
///   to 0 the value is finalized, dropped, and the index recycled.
///
/// Values sit behind one `RwLock`, reference counts and generations behind
/// a separate `Mutex`. Adding or removing an owner that is not the last one
/// never waits for value guards, so handles of a pool can be cloned and
/// dropped while a guard from the same pool is held. Only the release of
/// the last owner takes the value lock.
///
/// Lock order: value lock, then metadata lock. The metadata lock is never
/// held while waiting for the value lock.
///
/// Most code goes through [`Handle`](crate::pool::Handle) instead of
/// calling these methods directly.
pub struct ResourcePool<T: Poolable> {
    label: String,
    capacity: u32,
    indices: IndexAllocator,
    values: RwLock<Box<[Option<T>]>>,
    meta: Mutex<Box<[SlotMeta]>>,
    /// Allocator charged for the slot arrays, and the number of bytes reserved
    memory: Option<(Arc<MemoryAllocator>, usize)>,
}

impl<T: Poolable> ResourcePool<T> {
    /// Bytes of storage per slot (value plus metadata)
    const SLOT_BYTES: usize = std::mem::size_of::<Option<T>>() + std::mem::size_of::<SlotMeta>();

    /// Create a pool with `capacity` slots
    pub fn new(capacity: u32, label: impl Into<String>) -> Self {
        let values: Box<[Option<T>]> = (0..capacity).map(|_| None).collect();
        let meta: Box<[SlotMeta]> = vec![SlotMeta::default(); capacity as usize].into_boxed_slice();
        Self {
            label: label.into(),
            capacity,
            indices: IndexAllocator::new(capacity),
            values: RwLock::new(values),
            meta: Mutex::new(meta),
            memory: None,
        }
    }

    /// Create a pool whose slot arrays are accounted to `allocator`
    ///
    /// # Errors
    ///
    /// Propagates the allocator refusal (e.g. the `Invalid` placeholder).
    pub fn with_allocator(
        capacity: u32,
        label: impl Into<String>,
        allocator: Arc<MemoryAllocator>,
    ) -> Result<Self> {
        let label = label.into();
        let bytes = capacity as usize * Self::SLOT_BYTES;
        allocator.reserve(bytes, &label)?;

        let mut pool = Self::new(capacity, label);
        pool.memory = Some((allocator, bytes));
        Ok(pool)
    }

    /// Allocate a slot holding `T::default()`
    ///
    /// Returns the slot index and its current generation. The reference
    /// count of the new slot is 1.
    ///
    /// # Errors
    ///
    /// `CapacityExhausted` when every slot is live.
    pub fn allocate(&self) -> Result<(u32, u16)> {
        // Built before locking: a Default impl may itself touch pools
        let value = T::default();
        let index = self.indices.allocate()?;

        // Value first: the slot only becomes reachable once its count is set
        let previous = self.values.write()[index as usize].replace(value);
        debug_assert!(previous.is_none(), "allocator handed out occupied slot {}", index);

        let generation = {
            let mut meta = self.meta.lock();
            let slot = &mut meta[index as usize];
            debug_assert!(!slot.is_live(), "allocator handed out live slot {}", index);
            slot.ref_count = 1;
            slot.generation
        };

        engine_trace!("bpool::ResourcePool", "'{}': slot {} allocated (generation {})",
            self.label, index, generation);
        Ok((index, generation))
    }

    /// Generation-checked shared access
    ///
    /// Returns `None` for out-of-range indices, stale generations and free
    /// slots. The guard holds the pool's value read lock.
    pub fn get_resource(&self, index: u32, generation: u16) -> Option<MappedRwLockReadGuard<'_, T>> {
        // Checked under the value lock: a release cannot take the value while it is held
        let values = self.values.read();
        if !self.is_live(index, generation) {
            return None;
        }
        RwLockReadGuard::try_map(values, |values| {
            values.get(index as usize).and_then(Option::as_ref)
        })
        .ok()
    }

    /// Generation-checked exclusive access
    ///
    /// Same rules as [`get_resource`](Self::get_resource); the guard holds
    /// the pool's value write lock.
    pub fn get_resource_mut(&self, index: u32, generation: u16) -> Option<MappedRwLockWriteGuard<'_, T>> {
        let values = self.values.write();
        if !self.is_live(index, generation) {
            return None;
        }
        RwLockWriteGuard::try_map(values, |values| {
            values.get_mut(index as usize).and_then(Option::as_mut)
        })
        .ok()
    }

    /// Add one owner to a live slot
    ///
    /// Only takes the metadata lock.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `index >= capacity`
    /// - `GenerationMismatch` if the pair is stale
    /// - `IndexNotAllocated` if the slot is free
    pub fn increase_ref_count(&self, index: u32, generation: u16) -> Result<()> {
        let mut meta = self.meta.lock();
        let slot = self.checked_slot(&mut meta, index, generation)?;
        if !slot.is_live() {
            return Err(log_error("bpool::ResourcePool", Error::IndexNotAllocated { index }));
        }
        slot.ref_count += 1;
        Ok(())
    }

    /// Remove one owner from a slot
    ///
    /// Returns `true` when this call released the last owner. The generation
    /// is bumped first, then the value is finalized and dropped before the
    /// index is recycled. Only the last release takes the value lock,
    /// so it waits for guards on the pool to be dropped.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `index >= capacity`
    /// - `GenerationMismatch` if the pair is stale
    /// - `RefCountUnderflow` if the slot has no owner left
    pub fn decrease_ref_count(&self, index: u32, generation: u16) -> Result<bool> {
        {
            let mut meta = self.meta.lock();
            let slot = self.checked_slot(&mut meta, index, generation)?;

            if slot.ref_count == 0 {
                return Err(log_error("bpool::ResourcePool", Error::RefCountUnderflow { index }));
            }

            slot.ref_count -= 1;
            if slot.ref_count > 0 {
                return Ok(false);
            }

            // Stale from here on: new lookups miss before the value is taken
            slot.generation = slot.generation.wrapping_add(1);
            if slot.generation == 0 {
                engine_warn!("bpool::ResourcePool",
                    "'{}': generation of slot {} wrapped around", self.label, index);
            }
        }

        let released = self.values.write()[index as usize].take();

        // No lock held: finalizers may release handles into any pool
        if let Some(mut value) = released {
            value.finalize();
        }

        self.indices.deallocate(index)?;

        engine_trace!("bpool::ResourcePool", "'{}': slot {} released", self.label, index);
        Ok(true)
    }

    /// Current reference count of a live slot
    pub fn ref_count(&self, index: u32, generation: u16) -> Option<u32> {
        let meta = self.meta.lock();
        meta.get(index as usize)
            .filter(|slot| slot.generation == generation && slot.is_live())
            .map(|slot| slot.ref_count)
    }

    /// Current generation of a slot, live or not
    pub fn generation_of(&self, index: u32) -> Option<u16> {
        self.meta.lock().get(index as usize).map(|slot| slot.generation)
    }

    /// Whether `(index, generation)` names a live value
    pub fn is_live(&self, index: u32, generation: u16) -> bool {
        self.ref_count(index, generation).is_some()
    }

    /// Number of live slots
    pub fn used_slot_count(&self) -> u32 {
        self.indices.used_count()
    }

    /// Number of slots that can still be allocated
    pub fn free_slot_count(&self) -> u32 {
        self.indices.free_count()
    }

    /// Total number of slots
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Debug label given at construction
    pub fn label(&self) -> &str {
        &self.label
    }

    fn checked_slot<'a>(
        &self,
        meta: &'a mut [SlotMeta],
        index: u32,
        generation: u16,
    ) -> Result<&'a mut SlotMeta> {
        let slot = meta.get_mut(index as usize).ok_or_else(|| {
            log_error(
                "bpool::ResourcePool",
                Error::OutOfRange { index, capacity: self.capacity },
            )
        })?;

        if slot.generation != generation {
            return Err(log_error(
                "bpool::ResourcePool",
                Error::GenerationMismatch { index, expected: generation, found: slot.generation },
            ));
        }
        Ok(slot)
    }
}

impl<T: Poolable> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        let live = self.indices.used_count();
        if live > 0 {
            engine_warn!("bpool::ResourcePool",
                "'{}' dropped with {} live slot(s); their values are dropped without finalize",
                self.label, live);
        }
        if let Some((allocator, bytes)) = self.memory.take() {
            allocator.release(bytes, &self.label);
        }
    }
}

// ============================================================================
// Type erasure
// ============================================================================

/// Type-erased view of a pool, as stored in the registry
///
/// `as_any()` lets the registry hand back the concrete `ResourcePool<T>`
/// through a checked downcast.
pub trait ErasedPool: Send + Sync {
    /// Debug label of the pool
    fn label(&self) -> &str;

    /// Name of the element type (`std::any::type_name`)
    fn element_type_name(&self) -> &'static str;

    /// Total number of slots
    fn capacity(&self) -> u32;

    /// Number of live slots
    fn used_slot_count(&self) -> u32;

    /// Access to the concrete pool for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T: Poolable> ErasedPool for ResourcePool<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn element_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn used_slot_count(&self) -> u32 {
        self.indices.used_count()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_pool_tests.rs"]
mod tests;
