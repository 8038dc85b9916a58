//! Integration tests for pools, handles and the registry
//!
//! These tests drive the public API end to end. No GPU required.
//!
//! Run with: cargo test --test handle_lifecycle_integration_tests

use bindless_pool::bpool::{
    AllocatorId, DebugAllocator, Engine, Error, Finalize, Handle, MemoryAllocator, PoolId,
    RawHandle, ResourcePool,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

/// Each test registers its own pools; ids are unique per test in this binary
fn register<T: bindless_pool::bpool::Poolable>(id: u8, capacity: u32) -> PoolId {
    Engine::initialize().unwrap();
    let id = PoolId::new(id);
    Engine::registry()
        .unwrap()
        .register_pool(id, Arc::new(ResourcePool::<T>::new(capacity, format!("pool_{}", id.get()))))
        .unwrap();
    id
}

static CLOSED_FILES: AtomicU32 = AtomicU32::new(0);

/// Value with a side effect on release
#[derive(Default)]
struct OpenFile {
    path: String,
}

impl Finalize for OpenFile {
    fn finalize(&mut self) {
        if !self.path.is_empty() {
            CLOSED_FILES.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// LIFECYCLE TESTS
// ============================================================================

#[test]
fn test_integration_slot_reuse_bumps_generation() {
    let id = register::<u32>(10, 2);
    let pool = Engine::registry().unwrap().pool::<u32>(id).unwrap();

    let a = Handle::<u32>::new(id).unwrap();
    let b = Handle::<u32>::new(id).unwrap();
    assert_eq!((a.index(), a.generation()), (0, 0));
    assert_eq!((b.index(), b.generation()), (1, 0));
    assert_eq!(pool.used_slot_count(), 2);
    assert_eq!(Handle::<u32>::new(id).err(), Some(Error::CapacityExhausted { capacity: 2 }));

    *a.get_mut().unwrap() = 7;
    let stale = a.raw();
    drop(a);

    assert_eq!(pool.used_slot_count(), 1);
    assert!(pool.get_resource(stale.index, stale.generation).is_none());

    // The freed slot comes back with a new generation and a fresh value
    let c = Handle::<u32>::new(id).unwrap();
    assert_eq!((c.index(), c.generation()), (0, 1));
    assert_eq!(*c.get().unwrap(), 0);
    assert!(pool.get_resource(stale.index, stale.generation).is_none());
    assert_eq!(Handle::<u32>::from_raw(stale).err(), Some(Error::GenerationMismatch {
        index: 0,
        expected: 0,
        found: 1,
    }));

    drop(b);
    drop(c);
    assert_eq!(pool.used_slot_count(), 0);
}

#[test]
fn test_integration_shared_ownership() {
    let id = register::<String>(11, 4);

    let first = Handle::<String>::new(id).unwrap();
    first.get_mut().unwrap().push_str("shared");
    let second = first.clone();
    let third = second.try_clone().unwrap();
    assert_eq!(first.ref_count(), Some(3));

    drop(first);
    drop(second);
    assert_eq!(third.get().unwrap().as_str(), "shared");
    assert!(third.destroy().unwrap());
}

#[test]
fn test_integration_finalize_runs_once_on_last_release() {
    let id = register::<OpenFile>(12, 4);
    let before = CLOSED_FILES.load(Ordering::SeqCst);

    let file = Handle::<OpenFile>::new(id).unwrap();
    file.get_mut().unwrap().path = "/tmp/log.txt".to_string();
    let other = file.clone();

    drop(file);
    assert_eq!(CLOSED_FILES.load(Ordering::SeqCst), before);
    drop(other);
    assert_eq!(CLOSED_FILES.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_integration_raw_handle_crosses_threads() {
    let id = register::<u64>(13, 4);
    let handle = Handle::<u64>::new(id).unwrap();
    *handle.get_mut().unwrap() = 99;
    let raw: RawHandle = handle.raw();

    let seen = std::thread::spawn(move || {
        let adopted = Handle::<u64>::from_raw(raw).unwrap();
        let value = *adopted.get().unwrap();
        drop(adopted);
        value
    })
    .join()
    .unwrap();

    assert_eq!(seen, 99);
    // The adopted reference was dropped in the thread
    assert_eq!(handle.ref_count(), Some(1));
}

#[test]
fn test_integration_handles_dropped_on_many_threads() {
    let id = register::<u32>(14, 64);
    let handle = Handle::<u32>::new(id).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let local = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let copy = local.clone();
                    drop(copy);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(handle.ref_count(), Some(1));
}

// ============================================================================
// REGISTRY TESTS
// ============================================================================

#[test]
fn test_integration_wrong_type_rejected() {
    let id = register::<u32>(15, 2);
    assert!(matches!(
        Handle::<String>::new(id),
        Err(Error::PoolTypeMismatch { id: 15, .. })
    ));
}

#[test]
fn test_integration_pool_backed_by_allocator() {
    Engine::initialize().unwrap();
    let registry = Engine::registry().unwrap();
    let allocator_id = AllocatorId::new(20);
    registry
        .register_allocator(allocator_id, MemoryAllocator::Debug(DebugAllocator::new()))
        .unwrap();

    let id = PoolId::new(16);
    registry.create_pool::<u32>(id, 8, "tracked", allocator_id).unwrap();

    let stats = registry.allocator(allocator_id).unwrap().stats().unwrap();
    assert!(stats.live_bytes > 0);
    assert_eq!(stats.reservations, 1);

    let handle = Handle::<u32>::new(id).unwrap();
    assert!(handle.is_valid());
}
