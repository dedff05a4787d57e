//! Segment blocks.
//!
//! A segment block is the ordered list of physical segments that make up one
//! long value. Descriptors are appended while the chain is walked; segment
//! bytes are only read from the file handle when a caller asks for them and
//! are then kept in a bounded [`SegmentCache`].

mod cache;

pub use cache::{CacheStats, SegmentCache};

use crate::error::{CoreError, CoreResult};
use bytes::Bytes;
use longval_storage::FileIo;
use tracing::trace;

/// Location of one segment, both within the long value and within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Logical offset of the segment within the long value.
    pub value_offset: u32,
    /// Absolute offset of the segment data within the file.
    pub file_offset: u64,
    /// Size of the segment data in bytes.
    pub size: u32,
}

impl SegmentDescriptor {
    /// Returns the logical offset one past the end of the segment.
    #[must_use]
    pub fn value_end(&self) -> u64 {
        u64::from(self.value_offset) + u64::from(self.size)
    }
}

/// Ordered, gap-free list of segment descriptors.
#[derive(Debug, Default)]
pub struct SegmentBlock {
    descriptors: Vec<SegmentDescriptor>,
    data_size: u64,
}

impl SegmentBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty block with room for `hint` descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AllocationFailure`] if the reservation cannot be
    /// satisfied.
    pub fn with_capacity_hint(hint: usize) -> CoreResult<Self> {
        let mut descriptors = Vec::new();
        descriptors.try_reserve(hint).map_err(|e| {
            CoreError::allocation_failure(format!("unable to create data block: {e}"))
        })?;

        Ok(Self {
            descriptors,
            data_size: 0,
        })
    }

    /// Appends a descriptor and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadFailure`] if the descriptor does not start
    /// where the previous segment ended.
    pub fn append(&mut self, descriptor: SegmentDescriptor) -> CoreResult<usize> {
        if u64::from(descriptor.value_offset) != self.data_size {
            return Err(CoreError::read_failure(format!(
                "segment at offset {} does not continue block of {} bytes",
                descriptor.value_offset, self.data_size
            )));
        }

        let index = self.descriptors.len();
        self.descriptors.push(descriptor);
        self.data_size = descriptor.value_end();

        trace!(
            index,
            value_offset = descriptor.value_offset,
            size = descriptor.size,
            "segment appended"
        );

        Ok(index)
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the block holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the total size of all segments.
    #[must_use]
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Returns the descriptor at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.descriptors.get(index)
    }

    /// Returns all descriptors in logical order.
    #[must_use]
    pub fn descriptors(&self) -> &[SegmentDescriptor] {
        &self.descriptors
    }

    /// Returns the index of the segment containing logical `offset`.
    #[must_use]
    pub fn index_of(&self, offset: u64) -> Option<usize> {
        if offset >= self.data_size {
            return None;
        }
        let index = self
            .descriptors
            .partition_point(|d| d.value_end() <= offset);
        Some(index)
    }

    /// Returns the bytes of segment `index`.
    ///
    /// A cached buffer is returned without touching the file handle. On a miss
    /// the segment is read at its recorded file offset and inserted into the
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `index` is out of range ([`CoreError::UnsupportedValue`])
    /// - the read fails ([`CoreError::ReadFailure`])
    pub fn segment_data(
        &self,
        index: usize,
        io: &dyn FileIo,
        cache: &mut SegmentCache,
    ) -> CoreResult<Bytes> {
        let descriptor = self.get(index).ok_or_else(|| {
            CoreError::unsupported_value(format!(
                "invalid segment index: {index}, block holds {} segments",
                self.len()
            ))
        })?;

        if let Some(data) = cache.get(index) {
            return Ok(data);
        }

        let data = io
            .read_at(descriptor.file_offset, descriptor.size as usize)
            .map_err(|e| {
                CoreError::read_failure(format!(
                    "unable to read segment {index} at file offset {}: {e}",
                    descriptor.file_offset
                ))
            })?;

        let data = Bytes::from(data);
        cache.insert(index, data.clone());
        Ok(data)
    }
}
