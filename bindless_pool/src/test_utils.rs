//! Shared helpers for unit tests

use std::sync::atomic::{AtomicU8, Ordering};

use crate::registry::PoolId;

/// Unit tests share the process registry; each test takes its own ids from
/// the top of the table so they never collide with configured defaults.
static NEXT_POOL_ID: AtomicU8 = AtomicU8::new(255);

/// Unused pool id in the process registry
pub(crate) fn next_pool_id() -> PoolId {
    let id = NEXT_POOL_ID.fetch_sub(1, Ordering::Relaxed);
    assert!(id > 16, "unit tests ran out of pool ids");
    PoolId::new(id)
}
