/// Mock descriptor writer for unit tests (no GPU required)
///
/// Records every write and can be told to fail on a given frame slot.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bindless::{DescriptorResource, DescriptorWriter};
use crate::engine_bail;
use crate::error::Result;

/// One recorded `write_descriptor` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedWrite {
    pub frame_slot: u32,
    pub index: u32,
    pub resource: DescriptorResource,
}

#[derive(Default)]
struct MockState {
    writes: Vec<RecordedWrite>,
    fail_on_frame_slot: Option<u32>,
}

/// Test-side view of a [`MockDescriptorWriter`]
#[derive(Clone, Default)]
pub struct MockWriterLog {
    state: Arc<Mutex<MockState>>,
}

impl MockWriterLog {
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Writes that targeted `index`, in call order
    pub fn writes_to(&self, index: u32) -> Vec<RecordedWrite> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|write| write.index == index)
            .copied()
            .collect()
    }

    /// Fail every write targeting `frame_slot` (`None` to stop failing)
    pub fn fail_on_frame_slot(&self, frame_slot: Option<u32>) {
        self.state.lock().fail_on_frame_slot = frame_slot;
    }

    pub fn clear(&self) {
        self.state.lock().writes.clear();
    }
}

pub struct MockDescriptorWriter {
    state: Arc<Mutex<MockState>>,
}

impl MockDescriptorWriter {
    /// Writer plus the log that observes it
    pub fn new() -> (Self, MockWriterLog) {
        let log = MockWriterLog::default();
        (Self { state: log.state.clone() }, log)
    }

    pub fn boxed() -> (Box<dyn DescriptorWriter>, MockWriterLog) {
        let (writer, log) = Self::new();
        (Box::new(writer), log)
    }
}

impl DescriptorWriter for MockDescriptorWriter {
    fn write_descriptor(
        &mut self,
        frame_slot: u32,
        index: u32,
        resource: &DescriptorResource,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_on_frame_slot == Some(frame_slot) {
            engine_bail!("bpool::MockDescriptorWriter",
                "Injected failure writing index {} in frame slot {}", index, frame_slot);
        }
        state.writes.push(RecordedWrite { frame_slot, index, resource: *resource });
        Ok(())
    }
}
