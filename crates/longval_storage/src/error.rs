//! Error types for file handle operations.

use std::io;
use thiserror::Error;

/// Result type for file handle operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while accessing a file handle.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the stream.
    #[error("read beyond end of stream: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current stream size.
        size: u64,
    },

    /// The handle is closed and not configured to open on demand.
    #[error("file handle is closed")]
    Closed,

    /// The handle could not be cloned.
    #[error("unable to clone file handle: {0}")]
    Clone(String),
}
