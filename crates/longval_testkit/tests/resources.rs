//! Resource accounting across construction failures and release.

use longval_core::{Config, CoreError, CoreResult, LongValue, MemorySegmentStore, Ownership};
use longval_storage::{FileIo, MemoryHandle};
use longval_testkit::prelude::*;

fn tracked(fixture: &LongValueFixture) -> TrackingHandle {
    TrackingHandle::new(MemoryHandle::with_data(fixture.handle.data()))
}

fn create<'a>(
    store: &FaultyStore<MemorySegmentStore>,
    handle: &'a TrackingHandle,
    fixture: &LongValueFixture,
    config: &Config,
) -> CoreResult<LongValue<'a>> {
    LongValue::create(
        store,
        &(),
        &(),
        handle,
        fixture.id.as_bytes(),
        Ownership::CloneAndOwn,
        config,
    )
}

fn assert_store_fault(fault: StoreFault, check: fn(&CoreError) -> bool) {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), fault);

    let error = create(&store, &handle, &fixture, &Config::default()).unwrap_err();
    assert!(check(&error), "{fault:?} produced {error:?}");

    let ledger = handle.ledger();
    assert_eq!(ledger.clones(), 1);
    ledger.assert_balanced();
    assert!(handle.is_open());
}

#[test]
fn root_lookup_failure_releases_everything() {
    assert_store_fault(StoreFault::RootLookup, |e| {
        matches!(e, CoreError::LookupFailure { .. })
    });
}

#[test]
fn root_missing_releases_everything() {
    assert_store_fault(StoreFault::RootMissing, |e| {
        matches!(e, CoreError::LookupFailure { .. })
    });
}

#[test]
fn root_read_failure_releases_everything() {
    assert_store_fault(StoreFault::RootRead, |e| {
        matches!(e, CoreError::ReadFailure { .. })
    });
}

#[test]
fn segment_lookup_failure_releases_everything() {
    assert_store_fault(StoreFault::SegmentLookup(4096), |e| {
        matches!(e, CoreError::LookupFailure { .. })
    });
}

#[test]
fn segment_read_failure_releases_everything() {
    for offset in [0, 4096] {
        assert_store_fault(StoreFault::SegmentRead(offset), |e| {
            matches!(e, CoreError::ReadFailure { .. })
        });
    }
}

#[test]
fn segment_size_disagreement_releases_everything() {
    assert_store_fault(StoreFault::SegmentSize(0), |e| {
        matches!(e, CoreError::ReadFailure { .. })
    });
}

#[test]
fn lookup_failure_is_not_treated_as_chain_end() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::SegmentLookup(4608));

    let result = create(&store, &handle, &fixture, &Config::default());
    assert!(matches!(result, Err(CoreError::LookupFailure { .. })));
}

#[test]
fn chain_stops_after_not_found() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    // Root, offset 0, offset 4096, offset 4608.
    assert_eq!(store.lookups(), 4);
    assert_eq!(store.segment_reads(), 2);
    assert_eq!(value.segment_count(), 2);
}

#[test]
fn clone_failure_acquires_nothing() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    handle.faults().fail_clone();
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let result = create(&store, &handle, &fixture, &Config::default());
    assert!(matches!(result, Err(CoreError::HandleCloneFailure { .. })));

    let ledger = handle.ledger();
    assert_eq!(ledger.clones(), 0);
    assert_eq!(store.lookups(), 0);
    ledger.assert_balanced();
}

#[test]
fn open_on_demand_failure_frees_clone() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    handle.faults().fail_open_on_demand();
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let result = create(&store, &handle, &fixture, &Config::default());
    assert!(matches!(result, Err(CoreError::HandleCloneFailure { .. })));

    let ledger = handle.ledger();
    assert_eq!(ledger.clones(), 1);
    ledger.assert_balanced();
}

#[test]
fn block_creation_failure_frees_clone() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);
    let config = Config::new().segment_capacity_hint(usize::MAX);

    let result = create(&store, &handle, &fixture, &config);
    assert!(matches!(result, Err(CoreError::AllocationFailure { .. })));
    assert_eq!(store.lookups(), 0);
    handle.ledger().assert_balanced();
}

#[test]
fn cache_creation_failure_frees_clone() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);
    let config = Config::new().cache_capacity(0);

    let result = create(&store, &handle, &fixture, &config);
    assert!(matches!(result, Err(CoreError::UnsupportedValue { .. })));
    assert_eq!(store.lookups(), 0);
    handle.ledger().assert_balanced();
}

#[test]
fn wrong_id_size_acquires_nothing() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let result = LongValue::create(
        &store,
        &(),
        &(),
        &handle,
        &[0, 0, 0, 0, 1],
        Ownership::CloneAndOwn,
        &Config::default(),
    );
    assert!(matches!(result, Err(CoreError::UnsupportedValue { .. })));
    assert_eq!(handle.ledger().clones(), 0);
    assert_eq!(store.lookups(), 0);
}

#[test]
fn release_closes_then_frees_owned_clone() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    let ledger = handle.ledger();
    assert_eq!(ledger.live_clones(), 1);

    value.release().unwrap();
    ledger.assert_balanced();
    assert!(handle.is_open());
}

#[test]
fn borrowed_handle_is_never_closed() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = LongValue::create(
        &store,
        &(),
        &(),
        &handle,
        fixture.id.as_bytes(),
        Ownership::Borrow,
        &Config::default(),
    )
    .unwrap();
    value.release().unwrap();

    let ledger = handle.ledger();
    assert_eq!(ledger.clones(), 0);
    assert_eq!(ledger.closes(), 0);
    assert_eq!(ledger.frees(), 0);
    assert!(handle.is_open());
}

#[test]
fn close_failure_still_frees() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    handle.faults().fail_close();

    let result = value.release();
    assert!(matches!(result, Err(CoreError::CloseFailure { .. })));
    handle.ledger().assert_balanced();
}

#[test]
fn first_release_failure_wins() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    handle.faults().fail_close();
    handle.faults().fail_free();

    let result = value.release();
    assert!(matches!(result, Err(CoreError::CloseFailure { .. })));
    handle.ledger().assert_balanced();
}

#[test]
fn free_failure_is_reported() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    handle.faults().fail_free();

    let result = value.release();
    assert!(matches!(result, Err(CoreError::FinalizeFailure { .. })));
    handle.ledger().assert_balanced();
}

#[test]
fn drop_without_release_frees_clone() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);

    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    drop(value);
    handle.ledger().assert_balanced();
}

#[test]
fn cached_segment_is_not_read_again() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);
    let value = create(&store, &handle, &fixture, &Config::default()).unwrap();
    let ledger = handle.ledger();

    let before = ledger.reads();
    let first = value.segment_data(0).unwrap();
    assert_eq!(ledger.reads(), before + 1);

    let second = value.segment_data(0).unwrap();
    assert_eq!(ledger.reads(), before + 1);
    assert_eq!(first, second);
}

#[test]
fn evicted_segment_is_read_again() {
    let fixture = LongValueFixture::scenario();
    let handle = tracked(&fixture);
    let store = FaultyStore::new(fixture.store.clone(), StoreFault::None);
    let config = Config::new().cache_capacity(1);
    let value = create(&store, &handle, &fixture, &config).unwrap();
    let ledger = handle.ledger();

    let before = ledger.reads();
    let held = value.segment_data(0).unwrap();
    value.segment_data(1).unwrap();
    let again = value.segment_data(0).unwrap();

    assert_eq!(ledger.reads(), before + 3);
    assert_eq!(held, again);
    assert_eq!(value.cache_stats().evictions, 2);
}
