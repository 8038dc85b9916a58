/// Bindless index owned by a pooled resource

use std::fmt;
use std::sync::Arc;

use crate::bindless::{BindlessIndex, BindlessTable, DescriptorResource};
use crate::engine_warn;
use crate::error::Result;

/// A bindless index together with the table it came from
///
/// Pooled resources keep one in an `Option` and hand it back from their
/// finalizer with [`release`](Self::release), which starts the quarantine.
pub struct BindlessSlot {
    table: Arc<BindlessTable>,
    index: BindlessIndex,
}

impl BindlessSlot {
    pub(crate) fn new(table: Arc<BindlessTable>, index: BindlessIndex) -> Self {
        Self { table, index }
    }

    pub fn index(&self) -> BindlessIndex {
        self.index
    }

    /// Move to a fresh index describing `resource`
    ///
    /// The previous index goes through the usual quarantine. On error the
    /// slot keeps its index.
    pub fn replace(&mut self, resource: &DescriptorResource) -> Result<()> {
        self.index = self.table.replace(self.index, resource)?;
        Ok(())
    }

    /// Give the index back to the table (reusable after the frames in flight retire)
    pub fn release(self) {
        if let Err(error) = self.table.release(self.index) {
            engine_warn!("bpool::BindlessSlot", "Releasing {} failed: {}", self.index, error);
        }
    }
}

impl fmt::Debug for BindlessSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BindlessSlot").field(&self.index).finish()
    }
}
