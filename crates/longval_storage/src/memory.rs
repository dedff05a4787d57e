//! In-memory handle for testing.

use crate::error::{StorageError, StorageResult};
use crate::io::FileIo;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory file handle.
///
/// All clones of a handle share one byte buffer, mirroring several
/// descriptors open on the same file. Open state is per handle.
///
/// This handle is suitable for:
/// - Unit tests
/// - Integration tests
/// - Database images already loaded into memory
///
/// # Example
///
/// ```rust
/// use longval_storage::{FileIo, MemoryHandle};
///
/// let handle = MemoryHandle::with_data(b"test data".to_vec());
/// assert_eq!(handle.size().unwrap(), 9);
/// assert_eq!(&handle.read_at(5, 4).unwrap(), b"data");
/// ```
#[derive(Debug)]
pub struct MemoryHandle {
    data: Arc<RwLock<Vec<u8>>>,
    open: bool,
    open_on_demand: bool,
}

impl Default for MemoryHandle {
    fn default() -> Self {
        Self::with_data(Vec::new())
    }
}

impl MemoryHandle {
    /// Creates a new open handle over an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new open handle over pre-existing data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            open: true,
            open_on_demand: false,
        }
    }

    /// Appends bytes to the shared buffer and returns their offset.
    ///
    /// Used by fixtures to lay out segment data.
    pub fn append(&self, bytes: &[u8]) -> u64 {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        offset
    }

    /// Returns a copy of the shared buffer.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Returns whether deferred opening is enabled.
    #[must_use]
    pub fn open_on_demand(&self) -> bool {
        self.open_on_demand
    }
}

impl FileIo for MemoryHandle {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        if !self.open && !self.open_on_demand {
            return Err(StorageError::Closed);
        }

        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset as usize..end as usize].to_vec())
    }

    fn size(&self) -> StorageResult<u64> {
        if !self.open && !self.open_on_demand {
            return Err(StorageError::Closed);
        }
        Ok(self.data.read().len() as u64)
    }

    fn try_clone(&self) -> StorageResult<Box<dyn FileIo>> {
        Ok(Box::new(Self {
            data: Arc::clone(&self.data),
            open: false,
            open_on_demand: false,
        }))
    }

    fn set_open_on_demand(&mut self, open_on_demand: bool) -> StorageResult<()> {
        self.open_on_demand = open_on_demand;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> StorageResult<()> {
        self.open = false;
        Ok(())
    }
}
