//! File handle accessor trait definition.

use crate::error::StorageResult;
use std::fmt;

/// A positioned reader over a database file.
///
/// Handles are **opaque byte sources**. Callers that need to read the same
/// file from several places concurrently clone the handle instead of sharing
/// one stream position.
///
/// # Invariants
///
/// - `read_at` positions the stream explicitly before every read
/// - `try_clone` returns an independent handle that is not yet open
/// - a closed handle with open-on-demand set reopens on the next read
/// - `close` on a handle that is not open is a no-op
///
/// # Implementors
///
/// - [`super::MemoryHandle`] - For testing
/// - [`super::FileHandle`] - For files on disk
pub trait FileIo: Send + Sync + fmt::Debug {
    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The handle is closed and not open-on-demand
    /// - The read would extend beyond the end of the stream
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Returns the size of the underlying stream in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Creates an independent handle on the same stream.
    ///
    /// The clone starts out closed and does not inherit the open-on-demand
    /// setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be duplicated.
    fn try_clone(&self) -> StorageResult<Box<dyn FileIo>>;

    /// Enables or disables deferred opening.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting cannot be applied.
    fn set_open_on_demand(&mut self, open_on_demand: bool) -> StorageResult<()>;

    /// Returns whether the underlying stream is currently open.
    fn is_open(&self) -> bool;

    /// Closes the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream could not be closed cleanly.
    fn close(&mut self) -> StorageResult<()>;

    /// Releases the handle.
    ///
    /// The default implementation drops the handle and cannot fail.
    ///
    /// # Errors
    ///
    /// Returns an error if resources held by the handle could not be released.
    fn free(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}
