use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::log::log_error;

/// Allocates and recycles `u32` indices below a fixed capacity.
///
/// Backs both pool slots and bindless descriptor indices. Freed indices go
/// onto a LIFO free list and are handed out again before any fresh index,
/// except when the freed index is the most recently bumped one: then the
/// bump pointer moves back instead, which keeps stack-like usage dense.
///
/// All state sits behind one mutex. That is enough for occasional
/// cross-thread creation, not for contended parallel allocation.
///
/// # Example
///
/// ```ignore
/// let alloc = IndexAllocator::new(8);
/// let a = alloc.allocate()?;  // 0
/// let b = alloc.allocate()?;  // 1
/// alloc.deallocate(a)?;       // 0 goes to the free list
/// let c = alloc.allocate()?;  // 0 (recycled)
/// alloc.deallocate(c)?;
/// alloc.deallocate(b)?;       // 1 was the top: next_index drops back to 1
/// ```
pub struct IndexAllocator {
    capacity: u32,
    state: Mutex<IndexAllocatorState>,
}

struct IndexAllocatorState {
    /// Bump pointer: every index below it has been handed out at least once
    next_index: u32,
    /// LIFO stack of indices below `next_index` available for reuse
    free_list: Vec<u32>,
    /// Same contents as `free_list`, for O(1) double-free detection
    free_set: FxHashSet<u32>,
}

impl IndexAllocator {
    /// Create an allocator able to hand out `0..capacity`
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            state: Mutex::new(IndexAllocatorState {
                next_index: 0,
                free_list: Vec::new(),
                free_set: FxHashSet::default(),
            }),
        }
    }

    /// Allocate the next available index
    ///
    /// Recycled indices come first (most recently freed first).
    ///
    /// # Errors
    ///
    /// `CapacityExhausted` when every index below `capacity` is in use.
    pub fn allocate(&self) -> Result<u32> {
        let mut state = self.state.lock();

        if let Some(index) = state.free_list.pop() {
            state.free_set.remove(&index);
            return Ok(index);
        }

        if state.next_index < self.capacity {
            let index = state.next_index;
            state.next_index += 1;
            return Ok(index);
        }

        Err(log_error(
            "bpool::IndexAllocator",
            Error::CapacityExhausted { capacity: self.capacity },
        ))
    }

    /// Return an index for reuse
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `index >= capacity`
    /// - `IndexNotAllocated` if the index was never handed out or is
    ///   already free (double free)
    pub fn deallocate(&self, index: u32) -> Result<()> {
        if index >= self.capacity {
            return Err(log_error(
                "bpool::IndexAllocator",
                Error::OutOfRange { index, capacity: self.capacity },
            ));
        }

        let mut state = self.state.lock();

        if index >= state.next_index || state.free_set.contains(&index) {
            return Err(log_error(
                "bpool::IndexAllocator",
                Error::IndexNotAllocated { index },
            ));
        }

        if index + 1 == state.next_index {
            state.next_index -= 1;
        } else {
            state.free_list.push(index);
            state.free_set.insert(index);
        }
        Ok(())
    }

    /// Maximum number of indices this allocator can hand out
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Current bump pointer (one past the highest index in the dense range)
    pub fn next_index(&self) -> u32 {
        self.state.lock().next_index
    }

    /// Number of indices waiting on the free list
    pub fn free_list_len(&self) -> u32 {
        self.state.lock().free_list.len() as u32
    }

    /// Number of indices currently handed out
    pub fn used_count(&self) -> u32 {
        let state = self.state.lock();
        state.next_index - state.free_list.len() as u32
    }

    /// Number of indices that can still be allocated
    pub fn free_count(&self) -> u32 {
        self.capacity - self.used_count()
    }

    /// Whether no index is currently handed out
    pub fn is_empty(&self) -> bool {
        self.used_count() == 0
    }
}

impl std::fmt::Debug for IndexAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IndexAllocator")
            .field("capacity", &self.capacity)
            .field("next_index", &state.next_index)
            .field("free_list", &state.free_list)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "index_allocator_tests.rs"]
mod tests;
