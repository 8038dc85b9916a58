/// BindlessTable - bindless index lifetimes across frames in flight

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::bindless::{BindlessIndex, BindlessKind, DescriptorResource, DescriptorWriter};
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::log::log_error;
use crate::utils::IndexAllocator;
use crate::{engine_debug, engine_trace, engine_warn};

/// Lifecycle of one bindless index
///
/// `Unassigned -> Written -> Quarantined -> Unassigned`. Command buffers
/// recorded while the index was `Written` may still read the descriptor,
/// which is what the quarantine waits out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindlessState {
    Unassigned,
    Written,
    Quarantined { released_at: u64 },
}

struct KindTable {
    indices: IndexAllocator,
    states: Vec<BindlessState>,
    /// `(index, released_at)`, in release order so frames never decrease
    quarantine: VecDeque<(u32, u64)>,
}

impl KindTable {
    fn new(capacity: u32) -> Self {
        Self {
            indices: IndexAllocator::new(capacity),
            states: vec![BindlessState::Unassigned; capacity as usize],
            quarantine: VecDeque::new(),
        }
    }

    /// Return every index released at or before `frame` to the allocator
    fn reclaim_through(&mut self, frame: u64) -> u32 {
        let mut reclaimed = 0;
        while let Some(&(index, released_at)) = self.quarantine.front() {
            if released_at > frame {
                break;
            }
            self.quarantine.pop_front();
            self.states[index as usize] = BindlessState::Unassigned;
            // Failure is logged at the source and leaves the index out of circulation
            if self.indices.deallocate(index).is_ok() {
                reclaimed += 1;
            }
        }
        reclaimed
    }

    fn reclaim_all(&mut self) -> u32 {
        self.reclaim_through(u64::MAX)
    }
}

struct TableState {
    writer: Box<dyn DescriptorWriter>,
    kinds: [KindTable; 4],
    current_frame: u64,
}

impl TableState {
    fn kind(&self, kind: BindlessKind) -> &KindTable {
        &self.kinds[kind.slot()]
    }

    fn kind_mut(&mut self, kind: BindlessKind) -> &mut KindTable {
        &mut self.kinds[kind.slot()]
    }

    fn write_all_frames(
        &mut self,
        frames_in_flight: u32,
        index: u32,
        resource: &DescriptorResource,
    ) -> Result<()> {
        for frame_slot in 0..frames_in_flight {
            self.writer.write_descriptor(frame_slot, index, resource)?;
        }
        Ok(())
    }

    fn require_written(&self, index: BindlessIndex) -> Result<()> {
        match self.kind(index.kind).states.get(index.index as usize) {
            Some(BindlessState::Written) => Ok(()),
            _ => Err(log_error(
                "bpool::BindlessTable",
                Error::BindlessIndexNotLive { kind: index.kind, index: index.index },
            )),
        }
    }
}

/// Per-kind bindless index allocation mirrored into F descriptor sets
///
/// Every frame in flight owns a copy of the bindless descriptor set. An
/// assignment writes the descriptor into all copies at once, so the index
/// is valid whichever frame a shader runs in. A released index is held in
/// quarantine until every frame that could have recorded it has retired:
///
/// - implicitly: starting frame `N` means frame `N - F` completed
///   ([`advance_frame`](Self::advance_frame))
/// - explicitly: fence knowledge passed to
///   [`retire_completed`](Self::retire_completed)
///
/// # Example
///
/// ```ignore
/// let index = table.assign(&DescriptorResource::Sampler { sampler: raw })?;
/// // ... shaders use index.index ...
/// table.release(index)?;      // quarantined at the current frame
/// table.advance_frame();      // reusable once F frames have advanced
/// ```
pub struct BindlessTable {
    frames_in_flight: u32,
    state: Mutex<TableState>,
}

impl BindlessTable {
    /// Create the per-kind allocators from `config`
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the configuration does not validate.
    pub fn new(config: &PoolConfig, writer: Box<dyn DescriptorWriter>) -> Result<Self> {
        config.validate()?;

        let kinds = BindlessKind::ALL.map(|kind| KindTable::new(config.bindless_capacity(kind)));

        engine_debug!("bpool::BindlessTable",
            "Created: {} frames in flight, capacities buffer={} image={} sampler={} material={}",
            config.frames_in_flight, config.max_buffers, config.max_images,
            config.max_samplers, config.max_material_data);

        Ok(Self {
            frames_in_flight: config.frames_in_flight,
            state: Mutex::new(TableState { writer, kinds, current_frame: 0 }),
        })
    }

    /// Allocate an index for `resource` and write it into every frame copy
    ///
    /// # Errors
    ///
    /// - `CapacityExhausted` when the kind has no index left
    /// - any writer error; the index is then returned to the allocator
    pub fn assign(&self, resource: &DescriptorResource) -> Result<BindlessIndex> {
        let kind = resource.kind();
        let mut state = self.state.lock();

        let index = state.kind(kind).indices.allocate()?;

        if let Err(error) = state.write_all_frames(self.frames_in_flight, index, resource) {
            // Never written anywhere visible to a shader: reusable right away
            let _ = state.kind(kind).indices.deallocate(index);
            return Err(error);
        }

        state.kind_mut(kind).states[index as usize] = BindlessState::Written;
        engine_trace!("bpool::BindlessTable", "Assigned {} index {}", kind, index);
        Ok(BindlessIndex::new(kind, index))
    }

    /// Move a live index's resource to a fresh index holding `resource`
    ///
    /// Frames already recorded still read the old descriptor, so its copies
    /// are never overwritten: a new index is assigned and written, and `index`
    /// is quarantined at the current frame as if released. On failure `index`
    /// stays written and untouched.
    ///
    /// # Errors
    ///
    /// - `BindlessKindMismatch` if `resource` is of another kind
    /// - `BindlessIndexNotLive` if the index is not written
    /// - `CapacityExhausted` when the kind has no index left
    /// - any writer error
    pub fn replace(&self, index: BindlessIndex, resource: &DescriptorResource) -> Result<BindlessIndex> {
        if resource.kind() != index.kind {
            return Err(log_error(
                "bpool::BindlessTable",
                Error::BindlessKindMismatch { expected: index.kind, found: resource.kind() },
            ));
        }

        let mut state = self.state.lock();
        state.require_written(index)?;

        let kind = index.kind;
        let fresh = state.kind(kind).indices.allocate()?;
        if let Err(error) = state.write_all_frames(self.frames_in_flight, fresh, resource) {
            let _ = state.kind(kind).indices.deallocate(fresh);
            return Err(error);
        }

        let released_at = state.current_frame;
        let table = state.kind_mut(kind);
        table.states[fresh as usize] = BindlessState::Written;
        table.states[index.index as usize] = BindlessState::Quarantined { released_at };
        table.quarantine.push_back((index.index, released_at));

        engine_trace!("bpool::BindlessTable",
            "Replaced {} with index {} (frame {})", index, fresh, released_at);
        Ok(BindlessIndex::new(kind, fresh))
    }

    /// Stop using `index`; it becomes reusable once the current frame retires
    ///
    /// # Errors
    ///
    /// `BindlessIndexNotLive` if the index is unassigned or already released.
    pub fn release(&self, index: BindlessIndex) -> Result<()> {
        let mut state = self.state.lock();
        state.require_written(index)?;

        let released_at = state.current_frame;
        let table = state.kind_mut(index.kind);
        table.states[index.index as usize] = BindlessState::Quarantined { released_at };
        table.quarantine.push_back((index.index, released_at));

        engine_trace!("bpool::BindlessTable", "Released {} (frame {})", index, released_at);
        Ok(())
    }

    /// End the current frame and return the number of the new one
    ///
    /// Starting frame `N` implies frame `N - F` has completed on the GPU,
    /// so indices released during it or earlier are reclaimed.
    pub fn advance_frame(&self) -> u64 {
        let mut state = self.state.lock();
        state.current_frame += 1;
        let frame = state.current_frame;

        if let Some(completed) = frame.checked_sub(self.frames_in_flight as u64) {
            let reclaimed: u32 = state
                .kinds
                .iter_mut()
                .map(|table| table.reclaim_through(completed))
                .sum();
            if reclaimed > 0 {
                engine_debug!("bpool::BindlessTable",
                    "Frame {}: reclaimed {} index(es) released through frame {}",
                    frame, reclaimed, completed);
            }
        }
        frame
    }

    /// Reclaim everything released at or before `frame`, known complete
    ///
    /// Returns the number of indices returned to their allocators. A frame
    /// beyond the current one is clamped to it.
    pub fn retire_completed(&self, frame: u64) -> u32 {
        let mut state = self.state.lock();
        let frame = if frame > state.current_frame {
            engine_warn!("bpool::BindlessTable",
                "Frame {} retired before it started (current {})", frame, state.current_frame);
            state.current_frame
        } else {
            frame
        };

        state.kinds.iter_mut().map(|table| table.reclaim_through(frame)).sum()
    }

    /// Reclaim the whole quarantine
    ///
    /// Only valid once the device is idle (e.g. at shutdown).
    pub fn retire_all(&self) -> u32 {
        let mut state = self.state.lock();
        state.kinds.iter_mut().map(KindTable::reclaim_all).sum()
    }

    // ===== DIAGNOSTICS =====

    /// Lifecycle state of `index`, `None` if out of range
    pub fn state(&self, index: BindlessIndex) -> Option<BindlessState> {
        self.state.lock().kind(index.kind).states.get(index.index as usize).copied()
    }

    /// Number of written indices of `kind`
    pub fn live_count(&self, kind: BindlessKind) -> u32 {
        let state = self.state.lock();
        let table = state.kind(kind);
        table.indices.used_count() - table.quarantine.len() as u32
    }

    /// Number of quarantined indices of `kind`
    pub fn pending_count(&self, kind: BindlessKind) -> u32 {
        self.state.lock().kind(kind).quarantine.len() as u32
    }

    /// Number of indices of `kind` that can be assigned right now
    pub fn available_count(&self, kind: BindlessKind) -> u32 {
        self.state.lock().kind(kind).indices.free_count()
    }

    /// Descriptor array size of `kind`
    pub fn capacity(&self, kind: BindlessKind) -> u32 {
        self.state.lock().kind(kind).indices.capacity()
    }

    pub fn current_frame(&self) -> u64 {
        self.state.lock().current_frame
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }
}

impl std::fmt::Debug for BindlessTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindlessTable")
            .field("frames_in_flight", &self.frames_in_flight)
            .field("current_frame", &self.current_frame())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "bindless_table_tests.rs"]
mod tests;
