/// Handle - compact, reference-counted reference to a pooled value

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

use bytemuck::{Pod, Zeroable};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::engine::Engine;
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::log::log_error;
use crate::pool::{Poolable, ResourcePool};
use crate::registry::PoolId;

/// Owning reference to a value stored in a registered `ResourcePool<T>`
///
/// A handle is `{index, generation, pool_id}` and nothing more: it finds its
/// pool through the process registry on every access, and every access is
/// checked against the slot generation, so a handle whose slot was freed
/// and reused simply stops resolving.
///
/// Ownership follows Rust values:
/// - `clone()` adds an owner (reference count + 1)
/// - dropping removes one; the last drop finalizes the value
/// - moving transfers ownership without touching the pool
///
/// Handles do not implement `PartialEq`: two handles naming
/// the same slot are the same resource only while the generation matches,
/// which only the pool can tell.
///
/// # Example
///
/// ```no_run
/// use bindless_pool::bpool::{Engine, Handle, PoolId, ResourcePool};
/// use std::sync::Arc;
///
/// Engine::initialize()?;
/// let id = PoolId::new(7);
/// Engine::registry()?.register_pool(id, Arc::new(ResourcePool::<u32>::new(16, "counters")))?;
///
/// let a = Handle::<u32>::new(id)?;
/// *a.get_mut().unwrap() = 3;
/// let b = a.clone();           // ref count 2
/// drop(a);                     // ref count 1
/// assert_eq!(*b.get().unwrap(), 3);
/// # Ok::<(), bindless_pool::bpool::Error>(())
/// ```
pub struct Handle<T: Poolable> {
    index: u32,
    generation: u16,
    pool_id: PoolId,
    _marker: PhantomData<fn() -> T>,
}

const _: () = assert!(std::mem::size_of::<Handle<()>>() <= 8);

impl<T: Poolable> Handle<T> {
    /// Allocate a new value in the pool registered under `pool_id`
    ///
    /// The value starts as `T::default()` with a reference count of 1.
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` if the engine is not initialized
    /// - `InvalidPoolId`, `PoolNotRegistered`, `PoolTypeMismatch` from the lookup
    /// - `CapacityExhausted` if the pool is full
    pub fn new(pool_id: PoolId) -> Result<Self> {
        let pool = Engine::registry()?.pool::<T>(pool_id)?;
        let (index, generation) = pool.allocate()?;
        Ok(Self::from_parts(index, generation, pool_id))
    }

    /// Handle that refers to nothing (`pool_id` 0)
    pub const fn null() -> Self {
        Self::from_parts(0, 0, PoolId::NULL)
    }

    const fn from_parts(index: u32, generation: u16, pool_id: PoolId) -> Self {
        Self { index, generation, pool_id, _marker: PhantomData }
    }

    /// Whether this is the null handle
    pub fn is_null(&self) -> bool {
        self.pool_id.is_null()
    }

    /// Whether the handle still names a live value
    pub fn is_valid(&self) -> bool {
        !self.is_null() && self.ref_count().is_some()
    }

    /// Slot index inside the pool
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation captured at allocation
    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// Pool this handle belongs to
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Current number of owners, `None` if the handle is stale or null
    pub fn ref_count(&self) -> Option<u32> {
        if self.is_null() {
            return None;
        }
        self.pool().ok()?.ref_count(self.index, self.generation)
    }

    /// Shared access to the value
    ///
    /// The guard holds the pool's read lock: drop it before releasing the
    /// last handle of the same pool on this thread.
    pub fn get(&self) -> Option<MappedRwLockReadGuard<'static, T>> {
        if self.is_null() {
            return None;
        }
        self.pool().ok()?.get_resource(self.index, self.generation)
    }

    /// Exclusive access to the value
    ///
    /// Holds the pool's write lock for the lifetime of the guard.
    pub fn get_mut(&self) -> Option<MappedRwLockWriteGuard<'static, T>> {
        if self.is_null() {
            return None;
        }
        self.pool().ok()?.get_resource_mut(self.index, self.generation)
    }

    /// Fallible clone
    ///
    /// # Errors
    ///
    /// Fails when the handle is stale (the slot was released or reused).
    /// Cloning the null handle yields another null handle.
    pub fn try_clone(&self) -> Result<Self> {
        if self.is_null() {
            return Ok(Self::null());
        }
        self.pool()?.increase_ref_count(self.index, self.generation)?;
        Ok(Self::from_parts(self.index, self.generation, self.pool_id))
    }

    /// Release this owner explicitly
    ///
    /// Returns `true` when this was the last owner and the value has been
    /// finalized. Unlike `Drop`, failures are reported to the caller.
    pub fn destroy(self) -> Result<bool> {
        let this = ManuallyDrop::new(self);
        if this.is_null() {
            return Ok(false);
        }
        this.pool()?.decrease_ref_count(this.index, this.generation)
    }

    /// Plain-old-data copy of the handle bits
    ///
    /// Does not add an owner.
    pub fn raw(&self) -> RawHandle {
        RawHandle {
            index: self.index,
            generation: self.generation,
            pool_id: self.pool_id.get(),
            _pad: 0,
        }
    }

    /// Adopt a new owning reference from raw bits
    ///
    /// # Errors
    ///
    /// `InvalidPoolId` for a null raw handle; otherwise the same failures
    /// as `try_clone()`.
    pub fn from_raw(raw: RawHandle) -> Result<Self> {
        let pool_id = PoolId::new(raw.pool_id);
        if pool_id.is_null() {
            return Err(log_error("bpool::Handle", Error::InvalidPoolId));
        }
        Engine::registry()?
            .pool::<T>(pool_id)?
            .increase_ref_count(raw.index, raw.generation)?;
        Ok(Self::from_parts(raw.index, raw.generation, pool_id))
    }

    fn pool(&self) -> Result<&'static ResourcePool<T>> {
        Engine::registry()?.pool::<T>(self.pool_id)
    }
}

impl<T: Poolable> Clone for Handle<T> {
    /// Adds an owner
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale: cloning a released handle is a logic
    /// error. Use [`try_clone`](Handle::try_clone) to handle it instead.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(handle) => handle,
            Err(error) => panic!("cloning dead handle {:?}: {}", self, error),
        }
    }
}

impl<T: Poolable> Drop for Handle<T> {
    fn drop(&mut self) {
        if self.is_null() {
            return;
        }
        let result = self
            .pool()
            .and_then(|pool| pool.decrease_ref_count(self.index, self.generation));
        if let Err(error) = result {
            engine_warn!("bpool::Handle", "Dropping {:?} failed: {}", self, error);
        }
    }
}

impl<T: Poolable> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Poolable> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle<{}>(pool {}, index {}, generation {})",
            std::any::type_name::<T>(),
            self.pool_id.get(),
            self.index,
            self.generation
        )
    }
}

// ============================================================================
// RawHandle
// ============================================================================

/// Handle bits laid out for GPU-visible buffers
///
/// Exactly 8 bytes, no owner semantics. Turn it back into an owning
/// handle with [`Handle::from_raw`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct RawHandle {
    pub index: u32,
    pub generation: u16,
    pub pool_id: u8,
    _pad: u8,
}

const _: () = assert!(std::mem::size_of::<RawHandle>() == 8);

impl RawHandle {
    pub const fn new(index: u32, generation: u16, pool_id: u8) -> Self {
        Self { index, generation, pool_id, _pad: 0 }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
