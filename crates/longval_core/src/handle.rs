//! File handle ownership.
//!
//! A long value reads segment data either through the caller's handle or
//! through a private clone of it. The choice is fixed at construction and
//! decides what happens at release time.

use crate::error::{CoreError, CoreResult};
use longval_storage::FileIo;
use std::fmt;
use tracing::warn;

/// Flag bit requesting a private, managed clone of the file handle.
pub const FLAG_MANAGED_FILE_IO_HANDLE: u8 = 0x01;

/// How a long value holds its file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ownership {
    /// Use the caller's handle; never open, close or free it.
    #[default]
    Borrow,
    /// Clone the caller's handle, open it on demand, close and free it on
    /// release.
    CloneAndOwn,
}

impl Ownership {
    /// Decodes an item flags byte.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedValue`] if any bit other than
    /// [`FLAG_MANAGED_FILE_IO_HANDLE`] is set.
    pub fn from_flags(flags: u8) -> CoreResult<Self> {
        if flags & !FLAG_MANAGED_FILE_IO_HANDLE != 0 {
            return Err(CoreError::unsupported_value(format!(
                "unsupported flags: 0x{flags:02x}"
            )));
        }
        if flags & FLAG_MANAGED_FILE_IO_HANDLE != 0 {
            Ok(Self::CloneAndOwn)
        } else {
            Ok(Self::Borrow)
        }
    }

    /// Returns the flags byte for this mode.
    #[must_use]
    pub const fn flags(self) -> u8 {
        match self {
            Self::Borrow => 0,
            Self::CloneAndOwn => FLAG_MANAGED_FILE_IO_HANDLE,
        }
    }
}

/// A file handle held under one of the two [`Ownership`] disciplines.
///
/// An owned handle that was not released explicitly is closed and freed on
/// drop; failures are logged.
pub enum FileHandleOwner<'a> {
    /// The caller's handle.
    Borrowed(&'a dyn FileIo),
    /// A private clone; `None` once released.
    Owned(Option<Box<dyn FileIo>>),
}

impl<'a> FileHandleOwner<'a> {
    /// Wraps the caller's handle without taking ownership.
    #[must_use]
    pub fn borrow(handle: &'a dyn FileIo) -> Self {
        Self::Borrowed(handle)
    }

    /// Clones `handle` and configures the clone to open on demand.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HandleCloneFailure`] if the clone cannot be
    /// created or configured. A clone that was created is released before
    /// returning.
    pub fn clone_owned(handle: &dyn FileIo) -> CoreResult<Self> {
        let mut clone = handle
            .try_clone()
            .map_err(|e| CoreError::handle_clone_failure(format!("unable to copy file io handle: {e}")))?;

        if let Err(e) = clone.set_open_on_demand(true) {
            if let Err(close_error) = clone.close() {
                warn!(error = %close_error, "unable to close file io handle clone");
            }
            if let Err(free_error) = clone.free() {
                warn!(error = %free_error, "unable to free file io handle clone");
            }
            return Err(CoreError::handle_clone_failure(format!(
                "unable to set open on demand in file io handle: {e}"
            )));
        }

        Ok(Self::Owned(Some(clone)))
    }

    /// Acquires a handle under `ownership`.
    ///
    /// # Errors
    ///
    /// Returns an error if a clone is requested and cannot be made.
    pub fn acquire(handle: &'a dyn FileIo, ownership: Ownership) -> CoreResult<Self> {
        match ownership {
            Ownership::Borrow => Ok(Self::borrow(handle)),
            Ownership::CloneAndOwn => Self::clone_owned(handle),
        }
    }

    /// Returns the ownership mode.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        match self {
            Self::Borrowed(_) => Ownership::Borrow,
            Self::Owned(_) => Ownership::CloneAndOwn,
        }
    }

    /// Returns the handle to read through.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if an owned handle has already
    /// been released.
    pub fn io(&self) -> CoreResult<&dyn FileIo> {
        match self {
            Self::Borrowed(handle) => Ok(*handle),
            Self::Owned(Some(handle)) => Ok(handle.as_ref()),
            Self::Owned(None) => Err(CoreError::invalid_argument("file io handle released")),
        }
    }

    /// Closes and frees an owned handle.
    ///
    /// Both steps run even if the first fails; the first failure is returned.
    /// Borrowed and already released handles are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CloseFailure`] or [`CoreError::FinalizeFailure`].
    pub fn release(&mut self) -> CoreResult<()> {
        let Self::Owned(slot) = self else {
            return Ok(());
        };
        let Some(mut handle) = slot.take() else {
            return Ok(());
        };

        let mut first_error = None;

        if let Err(e) = handle.close() {
            first_error.get_or_insert(CoreError::close_failure(format!(
                "unable to close file io handle: {e}"
            )));
        }
        if let Err(e) = handle.free() {
            first_error.get_or_insert(CoreError::finalize_failure(format!(
                "unable to free file io handle: {e}"
            )));
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for FileHandleOwner<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "owned file io handle not released cleanly");
        }
    }
}

impl fmt::Debug for FileHandleOwner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed(handle) => f.debug_tuple("Borrowed").field(handle).finish(),
            Self::Owned(handle) => f.debug_tuple("Owned").field(handle).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longval_storage::{MemoryHandle, StorageError, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Handle whose clones refuse open-on-demand and count their cleanup.
    #[derive(Debug, Default, Clone)]
    struct StubbornHandle {
        closes: Arc<AtomicUsize>,
        frees: Arc<AtomicUsize>,
    }

    impl FileIo for StubbornHandle {
        fn read_at(&self, _offset: u64, _len: usize) -> StorageResult<Vec<u8>> {
            Err(StorageError::Closed)
        }

        fn size(&self) -> StorageResult<u64> {
            Ok(0)
        }

        fn try_clone(&self) -> StorageResult<Box<dyn FileIo>> {
            Ok(Box::new(self.clone()))
        }

        fn set_open_on_demand(&mut self, _open_on_demand: bool) -> StorageResult<()> {
            Err(StorageError::Clone("open on demand unsupported".into()))
        }

        fn is_open(&self) -> bool {
            false
        }

        fn close(&mut self) -> StorageResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn free(self: Box<Self>) -> StorageResult<()> {
            self.frees.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn flags_decode() {
        assert_eq!(Ownership::from_flags(0x00).unwrap(), Ownership::Borrow);
        assert_eq!(Ownership::from_flags(0x01).unwrap(), Ownership::CloneAndOwn);

        for flags in [0x02u8, 0x03, 0x80, 0xff] {
            assert!(matches!(
                Ownership::from_flags(flags),
                Err(CoreError::UnsupportedValue { .. })
            ));
        }
    }

    #[test]
    fn flags_roundtrip() {
        for ownership in [Ownership::Borrow, Ownership::CloneAndOwn] {
            assert_eq!(Ownership::from_flags(ownership.flags()).unwrap(), ownership);
        }
    }

    #[test]
    fn borrowed_handle_is_caller_handle() {
        let handle = MemoryHandle::with_data(b"abc".to_vec());
        let mut owner = FileHandleOwner::acquire(&handle, Ownership::Borrow).unwrap();

        assert_eq!(owner.ownership(), Ownership::Borrow);
        assert_eq!(owner.io().unwrap().read_at(0, 3).unwrap(), b"abc");

        owner.release().unwrap();
        drop(owner);
        assert!(handle.is_open());
    }

    #[test]
    fn owned_clone_opens_on_demand() {
        let handle = MemoryHandle::with_data(b"abc".to_vec());
        let mut owner = FileHandleOwner::acquire(&handle, Ownership::CloneAndOwn).unwrap();

        assert_eq!(owner.ownership(), Ownership::CloneAndOwn);
        assert_eq!(owner.io().unwrap().read_at(1, 2).unwrap(), b"bc");

        owner.release().unwrap();
        assert!(matches!(owner.io(), Err(CoreError::InvalidArgument { .. })));
        owner.release().unwrap();
        assert!(handle.is_open());
    }

    #[test]
    fn clone_is_closed_and_freed_when_open_on_demand_fails() {
        let handle = StubbornHandle::default();

        let result = FileHandleOwner::acquire(&handle, Ownership::CloneAndOwn);
        assert!(matches!(result, Err(CoreError::HandleCloneFailure { .. })));
        assert_eq!(handle.closes.load(Ordering::SeqCst), 1);
        assert_eq!(handle.frees.load(Ordering::SeqCst), 1);
    }
}
