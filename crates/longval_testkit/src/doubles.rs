//! Test doubles for resource accounting and fault injection.
//!
//! [`TrackingHandle`] counts every clone, close, free, drop and read made
//! through it or its clones, and fails selected operations on request.
//! [`FaultyStore`] wraps a segment store and fails one chosen step of long
//! value construction.

use longval_core::{
    CoreError, CoreResult, KeyMode, RootInfo, SegmentBlock, SegmentRecord, SegmentStore,
    SEGMENT_KEY_SIZE,
};
use longval_storage::{FileIo, MemoryHandle, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared by a tracking handle and all of its clones.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    clones: AtomicUsize,
    clone_drops: AtomicUsize,
    closes: AtomicUsize,
    frees: AtomicUsize,
    reads: AtomicUsize,
}

impl ResourceLedger {
    /// Number of clones created.
    pub fn clones(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    /// Number of clones dropped.
    pub fn clone_drops(&self) -> usize {
        self.clone_drops.load(Ordering::SeqCst)
    }

    /// Number of clones still alive.
    pub fn live_clones(&self) -> usize {
        self.clones() - self.clone_drops()
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of `free` calls.
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Number of `read_at` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Asserts that every clone was closed, freed and dropped exactly once.
    pub fn assert_balanced(&self) {
        assert_eq!(self.live_clones(), 0, "leaked file handle clone");
        assert_eq!(self.closes(), self.clones(), "clone not closed");
        assert_eq!(self.frees(), self.clones(), "clone not freed");
    }
}

/// Operations a [`TrackingHandle`] can be told to fail.
#[derive(Debug, Default)]
pub struct HandleFaults {
    fail_clone: AtomicBool,
    fail_open_on_demand: AtomicBool,
    fail_close: AtomicBool,
    fail_free: AtomicBool,
}

impl HandleFaults {
    /// Makes `try_clone` fail.
    pub fn fail_clone(&self) {
        self.fail_clone.store(true, Ordering::SeqCst);
    }

    /// Makes `set_open_on_demand` fail.
    pub fn fail_open_on_demand(&self) {
        self.fail_open_on_demand.store(true, Ordering::SeqCst);
    }

    /// Makes `close` fail.
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// Makes `free` fail.
    pub fn fail_free(&self) {
        self.fail_free.store(true, Ordering::SeqCst);
    }
}

/// A file handle that records its resource usage.
#[derive(Debug)]
pub struct TrackingHandle {
    inner: Box<dyn FileIo>,
    is_clone: bool,
    ledger: Arc<ResourceLedger>,
    faults: Arc<HandleFaults>,
}

impl TrackingHandle {
    /// Wraps an open in-memory image.
    pub fn new(inner: MemoryHandle) -> Self {
        Self {
            inner: Box::new(inner),
            is_clone: false,
            ledger: Arc::default(),
            faults: Arc::default(),
        }
    }

    /// Returns the ledger shared with all clones.
    pub fn ledger(&self) -> Arc<ResourceLedger> {
        Arc::clone(&self.ledger)
    }

    /// Returns the fault switches shared with all clones.
    pub fn faults(&self) -> Arc<HandleFaults> {
        Arc::clone(&self.faults)
    }

    fn injected(operation: &str) -> StorageError {
        StorageError::Io(io::Error::other(format!("injected {operation} failure")))
    }
}

impl FileIo for TrackingHandle {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.ledger.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_at(offset, len)
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn try_clone(&self) -> StorageResult<Box<dyn FileIo>> {
        if self.faults.fail_clone.load(Ordering::SeqCst) {
            return Err(StorageError::Clone("injected clone failure".into()));
        }

        let inner = self.inner.try_clone()?;
        self.ledger.clones.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(Self {
            inner,
            is_clone: true,
            ledger: Arc::clone(&self.ledger),
            faults: Arc::clone(&self.faults),
        }))
    }

    fn set_open_on_demand(&mut self, open_on_demand: bool) -> StorageResult<()> {
        if self.faults.fail_open_on_demand.load(Ordering::SeqCst) {
            return Err(Self::injected("open on demand"));
        }
        self.inner.set_open_on_demand(open_on_demand)
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn close(&mut self) -> StorageResult<()> {
        self.ledger.closes.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_close.load(Ordering::SeqCst) {
            return Err(Self::injected("close"));
        }
        self.inner.close()
    }

    fn free(self: Box<Self>) -> StorageResult<()> {
        self.ledger.frees.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_free.load(Ordering::SeqCst) {
            return Err(Self::injected("free"));
        }
        Ok(())
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        if self.is_clone {
            self.ledger.clone_drops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A construction step a [`FaultyStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// Fail nothing.
    None,
    /// Report a tree error on the root lookup.
    RootLookup,
    /// Report the root record as absent.
    RootMissing,
    /// Fail reading the root record.
    RootRead,
    /// Report a tree error on the segment lookup at this offset.
    SegmentLookup(u32),
    /// Fail reading the segment at this offset.
    SegmentRead(u32),
    /// Report a segment size different from the record's at this offset.
    SegmentSize(u32),
}

/// A segment store that fails one chosen step and counts calls.
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    fault: StoreFault,
    lookups: AtomicUsize,
    segment_reads: AtomicUsize,
}

impl<S: SegmentStore> FaultyStore<S> {
    /// Wraps `inner`, failing `fault`.
    pub fn new(inner: S, fault: StoreFault) -> Self {
        Self {
            inner,
            fault,
            lookups: AtomicUsize::new(0),
            segment_reads: AtomicUsize::new(0),
        }
    }

    /// Number of lookups made.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of segment reads made.
    pub fn segment_reads(&self) -> usize {
        self.segment_reads.load(Ordering::SeqCst)
    }
}

fn segment_offset(key: &[u8]) -> Option<u32> {
    if key.len() != SEGMENT_KEY_SIZE {
        return None;
    }
    let mut offset = [0u8; 4];
    offset.copy_from_slice(&key[4..]);
    Some(u32::from_le_bytes(offset))
}

impl<S: SegmentStore> SegmentStore for FaultyStore<S> {
    type Record = S::Record;
    type Pages = S::Pages;
    type PageCache = S::PageCache;

    fn lookup(
        &self,
        io: &dyn FileIo,
        pages: &S::Pages,
        page_cache: &S::PageCache,
        key: &[u8],
        mode: KeyMode,
    ) -> CoreResult<Option<S::Record>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        match (self.fault, mode) {
            (StoreFault::RootLookup, KeyMode::Reversed) => {
                return Err(CoreError::lookup_failure("injected root lookup failure"));
            }
            (StoreFault::RootMissing, KeyMode::Reversed) => return Ok(None),
            (StoreFault::SegmentLookup(at), KeyMode::Natural) if segment_offset(key) == Some(at) => {
                return Err(CoreError::lookup_failure("injected segment lookup failure"));
            }
            _ => {}
        }

        self.inner.lookup(io, pages, page_cache, key, mode)
    }

    fn read_root(
        &self,
        record: &S::Record,
        io: &dyn FileIo,
        pages: &S::Pages,
        page_cache: &S::PageCache,
    ) -> CoreResult<RootInfo> {
        if self.fault == StoreFault::RootRead {
            return Err(CoreError::read_failure("injected root read failure"));
        }
        self.inner.read_root(record, io, pages, page_cache)
    }

    fn read_segment(
        &self,
        record: &S::Record,
        io: &dyn FileIo,
        pages: &S::Pages,
        page_cache: &S::PageCache,
        offset: u32,
        block: &mut SegmentBlock,
    ) -> CoreResult<u32> {
        self.segment_reads.fetch_add(1, Ordering::SeqCst);

        match self.fault {
            StoreFault::SegmentRead(at) if at == offset => {
                Err(CoreError::read_failure("injected segment read failure"))
            }
            StoreFault::SegmentSize(at) if at == offset => {
                self.inner
                    .read_segment(record, io, pages, page_cache, offset, block)?;
                Ok(record.data_size().wrapping_add(1))
            }
            _ => self
                .inner
                .read_segment(record, io, pages, page_cache, offset, block),
        }
    }
}
