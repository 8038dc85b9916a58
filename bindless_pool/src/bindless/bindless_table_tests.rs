use super::*;
use crate::bindless::mock_descriptor_writer::{MockDescriptorWriter, MockWriterLog};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn table(frames_in_flight: u32) -> (BindlessTable, MockWriterLog) {
    let config = PoolConfig {
        max_buffers: 8,
        max_images: 8,
        max_samplers: 2,
        max_material_data: 4,
        frames_in_flight,
        ..Default::default()
    };
    let (writer, log) = MockDescriptorWriter::boxed();
    (BindlessTable::new(&config, writer).unwrap(), log)
}

fn buffer(raw: u64) -> DescriptorResource {
    DescriptorResource::Buffer { buffer: raw, offset: 0, range: 256 }
}

fn sampler(raw: u64) -> DescriptorResource {
    DescriptorResource::Sampler { sampler: raw }
}

// ============================================================================
// CREATION TESTS
// ============================================================================

#[test]
fn test_new_uses_config_capacities() {
    let (table, _) = table(3);
    assert_eq!(table.frames_in_flight(), 3);
    assert_eq!(table.current_frame(), 0);
    assert_eq!(table.capacity(BindlessKind::Buffer), 8);
    assert_eq!(table.capacity(BindlessKind::Sampler), 2);
    assert_eq!(table.capacity(BindlessKind::MaterialData), 4);
}

#[test]
fn test_new_rejects_invalid_config() {
    let config = PoolConfig { frames_in_flight: 0, ..Default::default() };
    let (writer, _) = MockDescriptorWriter::boxed();
    assert!(matches!(
        BindlessTable::new(&config, writer),
        Err(Error::InitializationFailed(_))
    ));
}

// ============================================================================
// ASSIGNMENT TESTS
// ============================================================================

#[test]
fn test_assign_writes_every_frame_copy() {
    let (table, log) = table(3);
    let index = table.assign(&buffer(0xAA)).unwrap();

    assert_eq!(index, BindlessIndex::new(BindlessKind::Buffer, 0));
    let writes = log.writes_to(0);
    assert_eq!(writes.len(), 3);
    for (frame_slot, write) in writes.iter().enumerate() {
        assert_eq!(write.frame_slot, frame_slot as u32);
        assert_eq!(write.resource, buffer(0xAA));
    }
    assert_eq!(table.state(index), Some(BindlessState::Written));
    assert_eq!(table.live_count(BindlessKind::Buffer), 1);
}

#[test]
fn test_kinds_have_independent_indices() {
    let (table, _) = table(2);
    let b = table.assign(&buffer(1)).unwrap();
    let s = table.assign(&sampler(2)).unwrap();
    let i = table.assign(&DescriptorResource::SampledImage { image_view: 3 }).unwrap();

    assert_eq!((b.index, s.index, i.index), (0, 0, 0));
    assert_eq!(s.kind, BindlessKind::Sampler);
    assert_eq!(i.kind, BindlessKind::SampledImage);
}

#[test]
fn test_assign_exhausts_kind_capacity() {
    let (table, _) = table(2);
    table.assign(&sampler(1)).unwrap();
    table.assign(&sampler(2)).unwrap();

    assert_eq!(table.assign(&sampler(3)), Err(Error::CapacityExhausted { capacity: 2 }));
    // Other kinds unaffected
    assert!(table.assign(&buffer(4)).is_ok());
}

#[test]
fn test_failed_write_does_not_leak_index() {
    let (table, log) = table(2);
    log.fail_on_frame_slot(Some(1));

    assert!(matches!(table.assign(&buffer(9)), Err(Error::BackendError(_))));
    assert_eq!(table.live_count(BindlessKind::Buffer), 0);
    assert_eq!(table.available_count(BindlessKind::Buffer), 8);
    assert_eq!(table.state(BindlessIndex::new(BindlessKind::Buffer, 0)), Some(BindlessState::Unassigned));

    log.fail_on_frame_slot(None);
    assert_eq!(table.assign(&buffer(9)).unwrap().index, 0);
}

// ============================================================================
// REPLACE TESTS
// ============================================================================

#[test]
fn test_replace_leaves_in_flight_copies_untouched() {
    let (table, log) = table(2);
    let old = table.assign(&buffer(1)).unwrap();
    table.advance_frame();
    log.clear();

    let fresh = table.replace(old, &buffer(2)).unwrap();

    assert_ne!(fresh.index, old.index);
    assert!(log.writes_to(old.index).is_empty());
    let writes = log.writes_to(fresh.index);
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|write| write.resource == buffer(2)));

    assert_eq!(table.state(fresh), Some(BindlessState::Written));
    assert_eq!(table.state(old), Some(BindlessState::Quarantined { released_at: 1 }));
    assert_eq!(table.live_count(BindlessKind::Buffer), 1);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 1);
}

#[test]
fn test_replaced_index_reclaimed_after_frames_in_flight() {
    let (table, _) = table(2);
    let old = table.assign(&buffer(1)).unwrap();
    table.replace(old, &buffer(2)).unwrap();

    table.advance_frame();
    assert!(matches!(table.state(old), Some(BindlessState::Quarantined { .. })));
    table.advance_frame();
    assert_eq!(table.state(old), Some(BindlessState::Unassigned));
    assert_eq!(table.pending_count(BindlessKind::Buffer), 0);
}

#[test]
fn test_replace_rejects_kind_mismatch_and_dead_index() {
    let (table, _) = table(2);
    let index = table.assign(&buffer(1)).unwrap();

    assert_eq!(
        table.replace(index, &sampler(1)),
        Err(Error::BindlessKindMismatch { expected: BindlessKind::Buffer, found: BindlessKind::Sampler })
    );

    table.release(index).unwrap();
    assert_eq!(
        table.replace(index, &buffer(2)),
        Err(Error::BindlessIndexNotLive { kind: BindlessKind::Buffer, index: 0 })
    );
}

#[test]
fn test_replace_failure_keeps_old_index_written() {
    let (table, log) = table(2);
    let first = table.assign(&sampler(1)).unwrap();
    table.assign(&sampler(2)).unwrap();

    // Both sampler indices are taken
    assert!(matches!(
        table.replace(first, &sampler(3)),
        Err(Error::CapacityExhausted { .. })
    ));
    assert_eq!(table.state(first), Some(BindlessState::Written));

    let buffer_index = table.assign(&buffer(1)).unwrap();
    log.fail_on_frame_slot(Some(1));
    assert!(matches!(table.replace(buffer_index, &buffer(2)), Err(Error::BackendError(_))));
    assert_eq!(table.state(buffer_index), Some(BindlessState::Written));
    assert_eq!(table.live_count(BindlessKind::Buffer), 1);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 0);
}

// ============================================================================
// RELEASE / QUARANTINE TESTS
// ============================================================================

#[test]
fn test_release_quarantines_at_current_frame() {
    let (table, _) = table(2);
    let index = table.assign(&buffer(1)).unwrap();
    table.advance_frame();

    table.release(index).unwrap();

    assert_eq!(table.state(index), Some(BindlessState::Quarantined { released_at: 1 }));
    assert_eq!(table.live_count(BindlessKind::Buffer), 0);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 1);
}

#[test]
fn test_release_errors() {
    let (table, _) = table(2);
    let never = BindlessIndex::new(BindlessKind::Buffer, 5);
    assert_eq!(
        table.release(never),
        Err(Error::BindlessIndexNotLive { kind: BindlessKind::Buffer, index: 5 })
    );

    let index = table.assign(&buffer(1)).unwrap();
    table.release(index).unwrap();
    assert_eq!(
        table.release(index),
        Err(Error::BindlessIndexNotLive { kind: BindlessKind::Buffer, index: 0 })
    );

    let out_of_range = BindlessIndex::new(BindlessKind::Buffer, 100);
    assert!(table.release(out_of_range).is_err());
    assert_eq!(table.state(out_of_range), None);
}

#[test]
fn test_released_index_not_reused_before_frames_in_flight_advance() {
    let (table, _) = table(2);
    let first = table.assign(&buffer(1)).unwrap();
    table.release(first).unwrap(); // released at frame 0

    // Frame 1: frame 0 may still be executing
    assert_eq!(table.advance_frame(), 1);
    assert_ne!(table.assign(&buffer(2)).unwrap().index, first.index);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 1);

    // Frame 2: frame 0 has retired
    assert_eq!(table.advance_frame(), 2);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 0);
    assert_eq!(table.state(first), Some(BindlessState::Unassigned));
    assert_eq!(table.assign(&buffer(3)).unwrap().index, first.index);
}

#[test]
fn test_single_frame_in_flight_reclaims_next_frame() {
    let (table, _) = table(1);
    let index = table.assign(&sampler(1)).unwrap();
    table.release(index).unwrap();

    table.advance_frame();
    assert_eq!(table.pending_count(BindlessKind::Sampler), 0);
}

#[test]
fn test_quarantine_reclaims_in_frame_order() {
    let (table, _) = table(3);
    let a = table.assign(&buffer(1)).unwrap();
    let b = table.assign(&buffer(2)).unwrap();

    table.release(a).unwrap(); // frame 0
    table.advance_frame();
    table.release(b).unwrap(); // frame 1

    table.advance_frame(); // 2
    assert_eq!(table.pending_count(BindlessKind::Buffer), 2);
    table.advance_frame(); // 3: frame 0 retired
    assert_eq!(table.state(a), Some(BindlessState::Unassigned));
    assert_eq!(table.state(b), Some(BindlessState::Quarantined { released_at: 1 }));
    table.advance_frame(); // 4: frame 1 retired
    assert_eq!(table.pending_count(BindlessKind::Buffer), 0);
}

#[test]
fn test_retire_completed_reclaims_through_frame() {
    let (table, _) = table(3);
    let a = table.assign(&buffer(1)).unwrap();
    let b = table.assign(&buffer(2)).unwrap();
    let s = table.assign(&sampler(3)).unwrap();

    table.release(a).unwrap(); // frame 0
    table.release(s).unwrap(); // frame 0
    table.advance_frame();
    table.release(b).unwrap(); // frame 1

    assert_eq!(table.retire_completed(0), 2);
    assert_eq!(table.pending_count(BindlessKind::Buffer), 1);
    assert_eq!(table.pending_count(BindlessKind::Sampler), 0);

    assert_eq!(table.retire_completed(1), 1);
    assert_eq!(table.retire_completed(1), 0);
}

#[test]
fn test_retire_completed_clamps_future_frame() {
    let (table, _) = table(2);
    let index = table.assign(&buffer(1)).unwrap();
    table.release(index).unwrap();

    assert_eq!(table.retire_completed(50), 1);
    assert_eq!(table.current_frame(), 0);
}

#[test]
fn test_retire_all_empties_quarantine() {
    let (table, _) = table(2);
    for raw in 0..4 {
        let index = table.assign(&buffer(raw)).unwrap();
        table.release(index).unwrap();
        table.advance_frame();
    }
    // Frame 4 reclaimed through frame 2; the frame 3 release is still pending
    assert_eq!(table.pending_count(BindlessKind::Buffer), 1);
    assert_eq!(table.retire_all(), 1);
    assert_eq!(table.available_count(BindlessKind::Buffer), 8);
}

#[test]
fn test_table_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BindlessTable>();
}
