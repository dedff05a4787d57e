//! Segment chain discovery.
//!
//! Segments of a long value are keyed by the cumulative offset at which they
//! start. The chain is walked by looking up offset 0, then the offset just
//! past each found segment, until a lookup finds nothing.

use crate::error::{CoreError, CoreResult};
use crate::key::LongValueId;
use crate::store::{KeyMode, SegmentRecord, SegmentStore};
use longval_storage::FileIo;
use std::iter::FusedIterator;
use tracing::trace;

/// A found segment record and the logical offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink<R> {
    /// Logical offset of the segment within the long value.
    pub offset: u32,
    /// The record returned by the store.
    pub record: R,
}

/// Lazy iterator over the segment records of one long value.
///
/// Yields links in offset order and ends at the first offset with no record.
/// After an error has been yielded the iterator is exhausted.
pub struct SegmentChain<'s, S: SegmentStore + ?Sized> {
    store: &'s S,
    io: &'s dyn FileIo,
    pages: &'s S::Pages,
    page_cache: &'s S::PageCache,
    id: LongValueId,
    next_offset: Option<u32>,
}

impl<'s, S: SegmentStore + ?Sized> SegmentChain<'s, S> {
    /// Creates a chain starting at offset 0.
    ///
    /// `pages` and `page_cache` are handed to every lookup.
    #[must_use]
    pub fn new(
        store: &'s S,
        io: &'s dyn FileIo,
        pages: &'s S::Pages,
        page_cache: &'s S::PageCache,
        id: LongValueId,
    ) -> Self {
        Self {
            store,
            io,
            pages,
            page_cache,
            id,
            next_offset: Some(0),
        }
    }
}

impl<S: SegmentStore + ?Sized> Iterator for SegmentChain<'_, S> {
    type Item = CoreResult<ChainLink<S::Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_offset.take()?;
        let key = self.id.segment_key(offset);

        let record = match self
            .store
            .lookup(self.io, self.pages, self.page_cache, &key, KeyMode::Natural)
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                trace!(id = %self.id, offset, "segment chain complete");
                return None;
            }
            Err(e) => {
                return Some(Err(CoreError::lookup_failure(format!(
                    "unable to retrieve segment of long value {} at offset {offset}: {e}",
                    self.id
                ))));
            }
        };

        let size = record.data_size();
        if size == 0 {
            return Some(Err(CoreError::read_failure(format!(
                "empty segment in long value {} at offset {offset}",
                self.id
            ))));
        }

        // A segment ending at 4 GiB is necessarily the last one.
        self.next_offset = offset.checked_add(size);
        trace!(id = %self.id, offset, size, "segment found");

        Some(Ok(ChainLink { offset, record }))
    }
}

impl<S: SegmentStore + ?Sized> FusedIterator for SegmentChain<'_, S> {}
