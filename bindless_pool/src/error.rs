//! Error types for the bindless pool core
//!
//! Every variant is a programming error surfaced fail-fast: a stale handle,
//! an exhausted capacity or a missing registration means the caller is
//! wrong, not that the operation should be retried.

use std::fmt;

use crate::bindless::BindlessKind;

/// Result type for pool, registry and bindless operations
pub type Result<T> = std::result::Result<T, Error>;

/// Bindless pool errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Allocator has neither a free-listed nor a fresh index left
    CapacityExhausted {
        capacity: u32,
    },

    /// Stale handle: the slot generation no longer matches
    GenerationMismatch {
        index: u32,
        expected: u16,
        found: u16,
    },

    /// Index is outside the allocator or pool capacity
    OutOfRange {
        index: u32,
        capacity: u32,
    },

    /// Reference count would drop below zero
    RefCountUnderflow {
        index: u32,
    },

    /// Index handed back to an allocator that does not have it allocated
    IndexNotAllocated {
        index: u32,
    },

    /// Pool id 0 is reserved
    InvalidPoolId,

    /// Nothing registered under this pool id
    PoolNotRegistered(u8),

    /// A pool is already registered under this pool id
    PoolAlreadyRegistered(u8),

    /// Pool registered under this id stores another element type
    PoolTypeMismatch {
        id: u8,
        expected: &'static str,
        found: &'static str,
    },

    /// Allocator id 0 is reserved
    InvalidAllocatorId,

    /// Nothing registered under this allocator id
    AllocatorNotRegistered(u8),

    /// An allocator is already registered under this allocator id
    AllocatorAlreadyRegistered(u8),

    /// The placeholder allocator was asked to hand out memory
    InvalidAllocator(String),

    /// Bindless index is not currently written (unassigned or quarantined)
    BindlessIndexNotLive {
        kind: BindlessKind,
        index: u32,
    },

    /// Descriptor resource does not belong to the bindless kind of the index
    BindlessKindMismatch {
        expected: BindlessKind,
        found: BindlessKind,
    },

    /// Backend-specific error (descriptor writes, Vulkan, etc.)
    BackendError(String),

    /// Invalid resource description
    InvalidResource(String),

    /// Initialization failed (engine, registry, configuration)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExhausted { capacity } => {
                write!(f, "Capacity exhausted: all {} slots in use", capacity)
            }
            Error::GenerationMismatch { index, expected, found } => write!(
                f,
                "Generation mismatch at slot {}: handle has {}, slot has {}",
                index, expected, found
            ),
            Error::OutOfRange { index, capacity } => {
                write!(f, "Index {} out of range (capacity: {})", index, capacity)
            }
            Error::RefCountUnderflow { index } => {
                write!(f, "Reference count underflow at slot {}", index)
            }
            Error::IndexNotAllocated { index } => {
                write!(f, "Index {} is not currently allocated", index)
            }
            Error::InvalidPoolId => write!(f, "Invalid pool index 0"),
            Error::PoolNotRegistered(id) => write!(f, "Pool {} not registered", id),
            Error::PoolAlreadyRegistered(id) => write!(f, "Pool {} already registered", id),
            Error::PoolTypeMismatch { id, expected, found } => write!(
                f,
                "Pool {} stores {}, requested {}",
                id, found, expected
            ),
            Error::InvalidAllocatorId => write!(f, "Invalid allocator index 0"),
            Error::AllocatorNotRegistered(id) => write!(f, "Allocator {} not registered", id),
            Error::AllocatorAlreadyRegistered(id) => {
                write!(f, "Allocator {} already registered", id)
            }
            Error::InvalidAllocator(msg) => write!(f, "Invalid allocator: {}", msg),
            Error::BindlessIndexNotLive { kind, index } => {
                write!(f, "Bindless {} index {} is not live", kind, index)
            }
            Error::BindlessKindMismatch { expected, found } => write!(
                f,
                "Bindless kind mismatch: expected {}, found {}",
                expected, found
            ),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
