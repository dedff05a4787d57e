//! Error types for long value reassembly.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while assembling or reading a long value.
#[derive(Debug, Error)]
pub enum CoreError {
    /// File handle error.
    #[error("storage error: {0}")]
    Storage(#[from] longval_storage::StorageError),

    /// A required argument is missing or empty.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument problem.
        message: String,
    },

    /// A value is outside what this reader supports.
    #[error("unsupported value: {message}")]
    UnsupportedValue {
        /// Description of the unsupported value.
        message: String,
    },

    /// Memory for a buffer or table could not be reserved.
    #[error("allocation failure: {message}")]
    AllocationFailure {
        /// Description of the failed allocation.
        message: String,
    },

    /// The caller's file handle could not be cloned or configured.
    #[error("unable to clone file handle: {message}")]
    HandleCloneFailure {
        /// Description of the failure.
        message: String,
    },

    /// The segment store reported an error or a required record is absent.
    #[error("lookup failure: {message}")]
    LookupFailure {
        /// Description of the failed lookup.
        message: String,
    },

    /// Root or segment data could not be read.
    #[error("read failure: {message}")]
    ReadFailure {
        /// Description of the failed read.
        message: String,
    },

    /// An owned file handle could not be closed.
    #[error("close failure: {message}")]
    CloseFailure {
        /// Description of the failure.
        message: String,
    },

    /// An owned resource could not be released.
    #[error("finalize failure: {message}")]
    FinalizeFailure {
        /// Description of the failure.
        message: String,
    },

    /// The reassembled size disagrees with the root record.
    #[error("long value size mismatch: root records {expected} bytes, segments hold {actual}")]
    SizeMismatch {
        /// Size recorded in the root record.
        expected: u64,
        /// Sum of the discovered segment sizes.
        actual: u64,
    },
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unsupported value error.
    pub fn unsupported_value(message: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            message: message.into(),
        }
    }

    /// Creates an allocation failure error.
    pub fn allocation_failure(message: impl Into<String>) -> Self {
        Self::AllocationFailure {
            message: message.into(),
        }
    }

    /// Creates a handle clone failure error.
    pub fn handle_clone_failure(message: impl Into<String>) -> Self {
        Self::HandleCloneFailure {
            message: message.into(),
        }
    }

    /// Creates a lookup failure error.
    pub fn lookup_failure(message: impl Into<String>) -> Self {
        Self::LookupFailure {
            message: message.into(),
        }
    }

    /// Creates a read failure error.
    pub fn read_failure(message: impl Into<String>) -> Self {
        Self::ReadFailure {
            message: message.into(),
        }
    }

    /// Creates a close failure error.
    pub fn close_failure(message: impl Into<String>) -> Self {
        Self::CloseFailure {
            message: message.into(),
        }
    }

    /// Creates a finalize failure error.
    pub fn finalize_failure(message: impl Into<String>) -> Self {
        Self::FinalizeFailure {
            message: message.into(),
        }
    }
}
