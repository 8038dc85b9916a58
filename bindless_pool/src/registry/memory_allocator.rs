/// Memory allocator variants that pools charge their slot storage to

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::log::log_error;
use crate::{engine_debug, engine_warn};

/// Backing allocator of a pool
///
/// Closed set, dispatched by `match`:
/// - `Invalid` is the placeholder for an unset entry and refuses everything
/// - `System` uses the global allocator with no bookkeeping
/// - `Debug` additionally tracks live/peak bytes per label
#[derive(Default)]
pub enum MemoryAllocator {
    #[default]
    Invalid,
    System,
    Debug(DebugAllocator),
}

impl MemoryAllocator {
    /// Account for `bytes` about to be used by `label`
    ///
    /// # Errors
    ///
    /// `InvalidAllocator` for the `Invalid` variant.
    pub fn reserve(&self, bytes: usize, label: &str) -> Result<()> {
        match self {
            MemoryAllocator::Invalid => Err(log_error(
                "bpool::MemoryAllocator",
                Error::InvalidAllocator(format!(
                    "cannot reserve {} bytes for '{}'", bytes, label
                )),
            )),
            MemoryAllocator::System => Ok(()),
            MemoryAllocator::Debug(debug) => {
                debug.reserve(bytes, label);
                Ok(())
            }
        }
    }

    /// Give back `bytes` previously reserved by `label`
    pub fn release(&self, bytes: usize, label: &str) {
        match self {
            MemoryAllocator::Invalid => {
                engine_warn!("bpool::MemoryAllocator",
                    "Release of {} bytes for '{}' on the invalid allocator", bytes, label);
            }
            MemoryAllocator::System => {}
            MemoryAllocator::Debug(debug) => debug.release(bytes, label),
        }
    }

    /// Bookkeeping snapshot, only tracked by `Debug`
    pub fn stats(&self) -> Option<AllocatorStats> {
        match self {
            MemoryAllocator::Debug(debug) => Some(debug.stats()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            MemoryAllocator::Invalid => "invalid",
            MemoryAllocator::System => "system",
            MemoryAllocator::Debug(_) => "debug",
        }
    }
}

/// Counters kept by [`DebugAllocator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently reserved
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached
    pub peak_bytes: usize,
    /// Number of `reserve` calls
    pub reservations: u64,
    /// Number of `release` calls
    pub releases: u64,
}

/// Bookkeeping allocator for development builds
///
/// Reports releases that exceed what a label reserved, and on drop any
/// label still holding memory.
pub struct DebugAllocator {
    state: Mutex<DebugAllocatorState>,
}

#[derive(Default)]
struct DebugAllocatorState {
    stats: AllocatorStats,
    by_label: FxHashMap<String, usize>,
}

impl DebugAllocator {
    pub fn new() -> Self {
        Self { state: Mutex::new(DebugAllocatorState::default()) }
    }

    fn reserve(&self, bytes: usize, label: &str) {
        let mut state = self.state.lock();
        *state.by_label.entry(label.to_string()).or_insert(0) += bytes;
        state.stats.reservations += 1;
        state.stats.live_bytes += bytes;
        state.stats.peak_bytes = state.stats.peak_bytes.max(state.stats.live_bytes);

        engine_debug!("bpool::DebugAllocator", "'{}' reserved {} bytes ({} live)",
            label, bytes, state.stats.live_bytes);
    }

    fn release(&self, bytes: usize, label: &str) {
        let mut state = self.state.lock();
        state.stats.releases += 1;

        let held = state.by_label.get(label).copied().unwrap_or(0);
        if bytes > held {
            engine_warn!("bpool::DebugAllocator",
                "'{}' released {} bytes but only held {}", label, bytes, held);
        }
        let released = bytes.min(held);
        if held == released {
            state.by_label.remove(label);
        } else {
            state.by_label.insert(label.to_string(), held - released);
        }
        state.stats.live_bytes -= released;
    }

    pub fn stats(&self) -> AllocatorStats {
        self.state.lock().stats
    }

    /// Bytes currently held by `label`
    pub fn label_bytes(&self, label: &str) -> usize {
        self.state.lock().by_label.get(label).copied().unwrap_or(0)
    }
}

impl Default for DebugAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DebugAllocator {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (label, bytes) in &state.by_label {
            engine_warn!("bpool::DebugAllocator", "Leak: '{}' still holds {} bytes", label, bytes);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "memory_allocator_tests.rs"]
mod tests;
