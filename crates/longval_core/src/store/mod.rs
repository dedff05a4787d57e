//! Segment store collaborator.
//!
//! The long-values tree of a table is a keyed B-tree holding, per long value,
//! one root record and one record per segment. Page layout and record parsing
//! belong to the implementor; the assembler only derives keys, asks for
//! records and hands them back for reading.

mod memory;

pub use memory::{MemoryRecord, MemorySegmentStore};

use crate::block::SegmentBlock;
use crate::error::CoreResult;
use longval_storage::FileIo;

/// How the store interprets the bytes of a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// Keys are compared as given.
    Natural,
    /// Keys are byte-reversed before comparison.
    Reversed,
}

/// Metadata held by a long value's root record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootInfo {
    /// Number of records referencing the long value.
    pub reference_count: u32,
    /// Total size of the long value in bytes.
    pub data_size: u32,
}

/// A record returned by a [`SegmentStore`] lookup.
pub trait SegmentRecord {
    /// Size in bytes of the data this record holds.
    fn data_size(&self) -> u32;
}

/// Keyed access to a long-values tree.
///
/// `Pages` and `PageCache` are passed through untouched from the caller of
/// [`crate::LongValue::create`] to every lookup and read.
pub trait SegmentStore {
    /// Record type produced by lookups.
    type Record: SegmentRecord;
    /// Page vector of the database file.
    type Pages: ?Sized;
    /// Cache of parsed pages.
    type PageCache: ?Sized;

    /// Looks up the record whose key exactly matches `key`.
    ///
    /// Returns `Ok(None)` if no such record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be traversed.
    fn lookup(
        &self,
        io: &dyn FileIo,
        pages: &Self::Pages,
        page_cache: &Self::PageCache,
        key: &[u8],
        mode: KeyMode,
    ) -> CoreResult<Option<Self::Record>>;

    /// Reads and validates a long value root record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not a valid root record.
    fn read_root(
        &self,
        record: &Self::Record,
        io: &dyn FileIo,
        pages: &Self::Pages,
        page_cache: &Self::PageCache,
    ) -> CoreResult<RootInfo>;

    /// Appends the segment held by `record` to `block` at logical `offset`.
    ///
    /// Returns the size of the segment data.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not a valid segment record or the
    /// block rejects the segment.
    fn read_segment(
        &self,
        record: &Self::Record,
        io: &dyn FileIo,
        pages: &Self::Pages,
        page_cache: &Self::PageCache,
        offset: u32,
        block: &mut SegmentBlock,
    ) -> CoreResult<u32>;
}
