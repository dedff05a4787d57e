//! Long value assembly.
//!
//! A long value is a column value too large to store inline. Its bytes live
//! in a chain of segment records in the table's long-values tree:
//!
//! ```text
//! root     key = reverse(id)       -> reference count, total size
//! segment  key = id | 0            -> bytes [0, s0)
//! segment  key = id | s0           -> bytes [s0, s0 + s1)
//! ...      until a key is missing
//! ```
//!
//! [`LongValue::create`] walks the chain once and records where every segment
//! lives. Segment bytes are read lazily through a bounded cache.

mod reader;

pub use reader::LongValueReader;

use crate::block::{CacheStats, SegmentBlock, SegmentCache, SegmentDescriptor};
use crate::chain::SegmentChain;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::handle::{FileHandleOwner, Ownership};
use crate::key::LongValueId;
use crate::store::{KeyMode, RootInfo, SegmentRecord, SegmentStore};
use bytes::Bytes;
use longval_storage::FileIo;
use parking_lot::Mutex;
use tracing::{debug, trace};

/// A reassembled long value.
///
/// The set of segments is fixed at construction. Reads go through the file
/// handle held under the [`Ownership`] chosen at construction.
///
/// A single instance is not meant to be shared between threads that read
/// concurrently; create one instance per reader with
/// [`Ownership::CloneAndOwn`] instead.
#[derive(Debug)]
pub struct LongValue<'a> {
    id: LongValueId,
    root: RootInfo,
    handle: FileHandleOwner<'a>,
    block: SegmentBlock,
    cache: Mutex<SegmentCache>,
}

impl<'a> LongValue<'a> {
    /// Reassembles long value `id` from `store`.
    ///
    /// Resources acquired before a failing step are released before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `id` is not four bytes long ([`CoreError::UnsupportedValue`])
    /// - the handle cannot be cloned ([`CoreError::HandleCloneFailure`])
    /// - the block or cache cannot be created
    /// - the root record is missing or a lookup fails ([`CoreError::LookupFailure`])
    /// - the root or a segment cannot be read ([`CoreError::ReadFailure`])
    /// - the size check is enabled and fails ([`CoreError::SizeMismatch`])
    pub fn create<S: SegmentStore + ?Sized>(
        store: &S,
        pages: &S::Pages,
        page_cache: &S::PageCache,
        handle: &'a dyn FileIo,
        id: &[u8],
        ownership: Ownership,
        config: &Config,
    ) -> CoreResult<Self> {
        let id = LongValueId::from_slice(id)?;

        let handle = FileHandleOwner::acquire(handle, ownership)?;
        let mut block = SegmentBlock::with_capacity_hint(config.segment_capacity_hint)?;
        let cache = SegmentCache::new(config.cache_capacity)?;
        let io = handle.io()?;

        let root = read_root(store, io, pages, page_cache, id)?;

        for link in SegmentChain::new(store, io, pages, page_cache, id) {
            let link = link?;
            let expected = link.record.data_size();
            let size = store
                .read_segment(&link.record, io, pages, page_cache, link.offset, &mut block)
                .map_err(|e| {
                    CoreError::read_failure(format!(
                        "unable to read segment of long value {id} at offset {}: {e}",
                        link.offset
                    ))
                })?;

            if size != expected {
                return Err(CoreError::read_failure(format!(
                    "segment of long value {id} at offset {}: reader returned {size} bytes, record holds {expected}",
                    link.offset
                )));
            }
        }

        if config.verify_data_size && block.data_size() != u64::from(root.data_size) {
            return Err(CoreError::SizeMismatch {
                expected: u64::from(root.data_size),
                actual: block.data_size(),
            });
        }

        debug!(
            %id,
            segments = block.len(),
            data_size = block.data_size(),
            ?ownership,
            "long value assembled"
        );

        Ok(Self {
            id,
            root,
            handle,
            block,
            cache: Mutex::new(cache),
        })
    }

    /// Returns the identifier of this long value.
    #[must_use]
    pub fn id(&self) -> LongValueId {
        self.id
    }

    /// Returns the metadata read from the root record.
    #[must_use]
    pub fn root(&self) -> RootInfo {
        self.root
    }

    /// Returns how the file handle is held.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.handle.ownership()
    }

    /// Returns the item flags recorded at construction.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.ownership().flags()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.block.len()
    }

    /// Returns the descriptors of all segments in logical order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentDescriptor] {
        self.block.descriptors()
    }

    /// Returns the total size of the reassembled value in bytes.
    #[must_use]
    pub fn data_size(&self) -> u64 {
        self.block.data_size()
    }

    /// Returns the bytes of segment `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedValue`] if `index` is not below
    /// [`Self::segment_count`], or a read error.
    pub fn segment_data(&self, index: usize) -> CoreResult<Bytes> {
        let io = self.handle.io()?;
        let mut cache = self.cache.lock();
        self.block.segment_data(index, io, &mut cache)
    }

    /// Reads the whole value into one buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment cannot be read or the value does not fit
    /// in memory.
    pub fn read_data(&self) -> CoreResult<Vec<u8>> {
        let size = usize::try_from(self.data_size()).map_err(|_| {
            CoreError::allocation_failure(format!("long value of {} bytes", self.data_size()))
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|e| CoreError::allocation_failure(format!("unable to create buffer: {e}")))?;

        for index in 0..self.segment_count() {
            data.extend_from_slice(&self.segment_data(index)?);
        }
        Ok(data)
    }

    /// Returns a reader positioned at the start of the value.
    #[must_use]
    pub fn reader(&self) -> LongValueReader<'_, 'a> {
        LongValueReader::new(self)
    }

    /// Returns the segment cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Releases the long value.
    ///
    /// An owned handle is closed and then freed; both steps are attempted and
    /// the first failure is reported. The block and cache are always dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CloseFailure`] or [`CoreError::FinalizeFailure`].
    pub fn release(self) -> CoreResult<()> {
        let Self {
            id,
            mut handle,
            block,
            cache,
            ..
        } = self;

        let result = handle.release();
        trace!(%id, segments = block.len(), cached = cache.lock().len(), "long value released");
        drop(cache);
        drop(block);
        result
    }
}

/// Releases the long value held in `slot`, leaving `None` behind.
///
/// Releasing an empty slot succeeds without doing anything.
///
/// # Errors
///
/// Returns the error reported by [`LongValue::release`].
pub fn release(slot: &mut Option<LongValue<'_>>) -> CoreResult<()> {
    match slot.take() {
        Some(value) => value.release(),
        None => Ok(()),
    }
}

fn read_root<S: SegmentStore + ?Sized>(
    store: &S,
    io: &dyn FileIo,
    pages: &S::Pages,
    page_cache: &S::PageCache,
    id: LongValueId,
) -> CoreResult<RootInfo> {
    let record = store
        .lookup(io, pages, page_cache, &id.root_key(), KeyMode::Reversed)
        .map_err(|e| {
            CoreError::lookup_failure(format!("unable to retrieve root of long value {id}: {e}"))
        })?
        .ok_or_else(|| CoreError::lookup_failure(format!("missing root of long value {id}")))?;

    let root = store
        .read_root(&record, io, pages, page_cache)
        .map_err(|e| CoreError::read_failure(format!("unable to read root of long value {id}: {e}")))?;

    trace!(%id, reference_count = root.reference_count, data_size = root.data_size, "root found");
    Ok(root)
}
