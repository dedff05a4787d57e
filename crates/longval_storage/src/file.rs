//! File-based handle for database files on disk.

use crate::error::{StorageError, StorageResult};
use crate::io::FileIo;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A read-only handle over a file on disk.
///
/// # Open on demand
///
/// A handle with open-on-demand set keeps no descriptor between reads: the
/// file is opened at the start of a read and closed again when it finishes.
/// This lets many handles on the same file coexist without exhausting the
/// process descriptor limit.
///
/// # Thread Safety
///
/// The stream is guarded by a mutex and every read seeks to its own offset,
/// so concurrent readers never observe each other's position.
///
/// # Example
///
/// ```no_run
/// use longval_storage::{FileHandle, FileIo};
/// use std::path::Path;
///
/// let handle = FileHandle::open(Path::new("database.edb")).unwrap();
/// let header = handle.read_at(0, 512).unwrap();
/// ```
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    file: Mutex<Option<File>>,
    open_on_demand: bool,
}

impl FileHandle {
    /// Opens the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
            open_on_demand: false,
        })
    }

    /// Creates a handle that opens `path` lazily on every read.
    ///
    /// No descriptor is acquired until the first read, so a missing file is
    /// only reported then.
    #[must_use]
    pub fn on_demand(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: Mutex::new(None),
            open_on_demand: true,
        }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether deferred opening is enabled.
    #[must_use]
    pub fn open_on_demand(&self) -> bool {
        self.open_on_demand
    }
}

impl FileIo for FileHandle {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            if !self.open_on_demand {
                return Err(StorageError::Closed);
            }
            *guard = Some(File::open(&self.path)?);
        }

        let result = match guard.as_mut() {
            Some(file) => read_exact_at(file, offset, len),
            None => Err(StorageError::Closed),
        };

        if self.open_on_demand {
            *guard = None;
        }

        result
    }

    fn size(&self) -> StorageResult<u64> {
        let guard = self.file.lock();
        match guard.as_ref() {
            Some(file) => Ok(file.metadata()?.len()),
            None if self.open_on_demand => Ok(std::fs::metadata(&self.path)?.len()),
            None => Err(StorageError::Closed),
        }
    }

    fn try_clone(&self) -> StorageResult<Box<dyn FileIo>> {
        Ok(Box::new(Self {
            path: self.path.clone(),
            file: Mutex::new(None),
            open_on_demand: false,
        }))
    }

    fn set_open_on_demand(&mut self, open_on_demand: bool) -> StorageResult<()> {
        self.open_on_demand = open_on_demand;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.lock().is_some()
    }

    fn close(&mut self) -> StorageResult<()> {
        self.file.get_mut().take();
        Ok(())
    }
}

fn read_exact_at(file: &mut File, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
    let size = file.metadata()?.len();
    let end = offset.saturating_add(len as u64);

    if offset > size || end > size {
        return Err(StorageError::ReadPastEnd { offset, len, size });
    }

    if len == 0 {
        return Ok(Vec::new());
    }

    file.seek(SeekFrom::Start(offset))?;

    let mut buffer = vec![0u8; len];
    file.read_exact(&mut buffer)?;

    Ok(buffer)
}
