//! In-memory segment store for testing.

use crate::block::{SegmentBlock, SegmentDescriptor};
use crate::error::{CoreError, CoreResult};
use crate::key::LongValueId;
use crate::store::{KeyMode, RootInfo, SegmentRecord, SegmentStore};
use longval_storage::{FileIo, MemoryHandle};
use std::collections::BTreeMap;

/// A record in a [`MemorySegmentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRecord {
    /// Root record of a long value.
    Root(RootInfo),
    /// Segment record pointing at data in the file.
    Segment {
        /// Absolute offset of the data within the file.
        file_offset: u64,
        /// Size of the data in bytes.
        size: u32,
    },
}

impl SegmentRecord for MemoryRecord {
    fn data_size(&self) -> u32 {
        match self {
            Self::Root(_) => 0,
            Self::Segment { size, .. } => *size,
        }
    }
}

/// An ordered in-memory key space standing in for a long-values tree.
///
/// Keys are stored in natural byte order. Reversed-mode lookups reverse the
/// probe key before comparing, so a root record inserted under an ID is found
/// by looking up that ID's [`LongValueId::root_key`].
///
/// # Example
///
/// ```rust
/// use longval_core::{Config, LongValue, LongValueId, MemorySegmentStore, Ownership};
/// use longval_storage::MemoryHandle;
///
/// let handle = MemoryHandle::new();
/// let id = LongValueId::from_bytes([0, 0, 0, 1]);
/// let mut store = MemorySegmentStore::new();
/// store.write_long_value(&handle, id, &[b"hello ".to_vec(), b"world".to_vec()]).unwrap();
///
/// let value = LongValue::create(
///     &store, &(), &(), &handle, id.as_bytes(), Ownership::Borrow, &Config::default(),
/// ).unwrap();
/// assert_eq!(value.segment_count(), 2);
/// assert_eq!(value.read_data().unwrap(), b"hello world");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySegmentStore {
    records: BTreeMap<Vec<u8>, MemoryRecord>,
}

impl MemorySegmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the root record of `id`.
    pub fn insert_root(&mut self, id: LongValueId, root: RootInfo) {
        self.records
            .insert(id.as_bytes().to_vec(), MemoryRecord::Root(root));
    }

    /// Inserts a segment record of `id` at logical `offset`.
    pub fn insert_segment(&mut self, id: LongValueId, offset: u32, file_offset: u64, size: u32) {
        self.records.insert(
            id.segment_key(offset).to_vec(),
            MemoryRecord::Segment { file_offset, size },
        );
    }

    /// Removes the record stored under `key` in natural order.
    pub fn remove(&mut self, key: &[u8]) -> Option<MemoryRecord> {
        self.records.remove(key)
    }

    /// Writes `segments` to `handle` and records them as long value `id`.
    ///
    /// The root record carries a reference count of one and the total size.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedValue`] if a segment or the total size
    /// does not fit in a `u32`.
    pub fn write_long_value(
        &mut self,
        handle: &MemoryHandle,
        id: LongValueId,
        segments: &[Vec<u8>],
    ) -> CoreResult<()> {
        let mut offset = 0u32;
        for segment in segments {
            let size = u32::try_from(segment.len()).map_err(|_| {
                CoreError::unsupported_value(format!("segment of {} bytes", segment.len()))
            })?;
            let next = offset.checked_add(size).ok_or_else(|| {
                CoreError::unsupported_value("long value larger than 4 GiB")
            })?;
            let file_offset = handle.append(segment);
            self.insert_segment(id, offset, file_offset, size);
            offset = next;
        }
        self.insert_root(
            id,
            RootInfo {
                reference_count: 1,
                data_size: offset,
            },
        );
        Ok(())
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SegmentStore for MemorySegmentStore {
    type Record = MemoryRecord;
    type Pages = ();
    type PageCache = ();

    fn lookup(
        &self,
        _io: &dyn FileIo,
        _pages: &(),
        _page_cache: &(),
        key: &[u8],
        mode: KeyMode,
    ) -> CoreResult<Option<MemoryRecord>> {
        if key.is_empty() {
            return Err(CoreError::invalid_argument("empty lookup key"));
        }

        let record = match mode {
            KeyMode::Natural => self.records.get(key),
            KeyMode::Reversed => {
                let reversed: Vec<u8> = key.iter().rev().copied().collect();
                self.records.get(&reversed)
            }
        };

        Ok(record.copied())
    }

    fn read_root(
        &self,
        record: &MemoryRecord,
        _io: &dyn FileIo,
        _pages: &(),
        _page_cache: &(),
    ) -> CoreResult<RootInfo> {
        match record {
            MemoryRecord::Root(root) => Ok(*root),
            MemoryRecord::Segment { .. } => Err(CoreError::read_failure(
                "record is a segment, not a long value root",
            )),
        }
    }

    fn read_segment(
        &self,
        record: &MemoryRecord,
        io: &dyn FileIo,
        _pages: &(),
        _page_cache: &(),
        offset: u32,
        block: &mut SegmentBlock,
    ) -> CoreResult<u32> {
        let MemoryRecord::Segment { file_offset, size } = *record else {
            return Err(CoreError::read_failure(
                "record is a long value root, not a segment",
            ));
        };

        let file_size = io.size()?;
        if file_offset.saturating_add(u64::from(size)) > file_size {
            return Err(CoreError::read_failure(format!(
                "segment at offset {offset} extends beyond file: {file_offset} + {size} > {file_size}"
            )));
        }

        block.append(SegmentDescriptor {
            value_offset: offset,
            file_offset,
            size,
        })?;

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_lookup_finds_root() {
        let handle = MemoryHandle::new();
        let id = LongValueId::from_bytes([1, 2, 3, 4]);
        let mut store = MemorySegmentStore::new();
        store.insert_root(id, RootInfo::default());

        let found = store.lookup(&handle, &(), &(), &id.root_key(), KeyMode::Reversed).unwrap();
        assert_eq!(found, Some(MemoryRecord::Root(RootInfo::default())));

        let natural = store.lookup(&handle, &(), &(), &id.root_key(), KeyMode::Natural).unwrap();
        assert_eq!(natural, None);
    }

    #[test]
    fn natural_lookup_finds_segment() {
        let handle = MemoryHandle::new();
        let id = LongValueId::from_bytes([0, 0, 0, 9]);
        let mut store = MemorySegmentStore::new();
        store.insert_segment(id, 16, 100, 8);

        let found = store.lookup(&handle, &(), &(), &id.segment_key(16), KeyMode::Natural).unwrap();
        assert_eq!(
            found,
            Some(MemoryRecord::Segment {
                file_offset: 100,
                size: 8
            })
        );
        assert_eq!(
            store.lookup(&handle, &(), &(), &id.segment_key(0), KeyMode::Natural).unwrap(),
            None
        );
    }

    #[test]
    fn empty_key_rejected() {
        let handle = MemoryHandle::new();
        let store = MemorySegmentStore::new();
        assert!(matches!(
            store.lookup(&handle, &(), &(), &[], KeyMode::Natural),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn write_long_value_lays_out_segments() {
        let handle = MemoryHandle::new();
        let id = LongValueId::from_bytes([0, 0, 0, 1]);
        let mut store = MemorySegmentStore::new();
        store.write_long_value(&handle, id, &[vec![1; 3], vec![2; 2]]).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(handle.data(), vec![1, 1, 1, 2, 2]);

        let root = store.lookup(&handle, &(), &(), &id.root_key(), KeyMode::Reversed).unwrap().unwrap();
        let info = store.read_root(&root, &handle, &(), &()).unwrap();
        assert_eq!(info.data_size, 5);
        assert_eq!(info.reference_count, 1);
    }

    #[test]
    fn read_segment_validates_record_kind_and_extent() {
        let handle = MemoryHandle::with_data(vec![0; 10]);
        let store = MemorySegmentStore::new();
        let mut block = SegmentBlock::new();

        let root = MemoryRecord::Root(RootInfo::default());
        assert!(matches!(
            store.read_segment(&root, &handle, &(), &(), 0, &mut block),
            Err(CoreError::ReadFailure { .. })
        ));

        let beyond = MemoryRecord::Segment {
            file_offset: 8,
            size: 4,
        };
        assert!(matches!(
            store.read_segment(&beyond, &handle, &(), &(), 0, &mut block),
            Err(CoreError::ReadFailure { .. })
        ));

        let segment = MemoryRecord::Segment {
            file_offset: 2,
            size: 4,
        };
        assert_eq!(
            store.read_segment(&segment, &handle, &(), &(), 0, &mut block).unwrap(),
            4
        );
        assert_eq!(block.len(), 1);
    }
}
