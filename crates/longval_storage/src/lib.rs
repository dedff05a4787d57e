//! # Longval Storage
//!
//! File handle accessors used by the long value reader.
//!
//! A handle is an **opaque positioned reader**: it knows how to read bytes at
//! an absolute offset, how to clone itself, and how to open and close the
//! underlying stream. It does not interpret pages, records or long values.
//!
//! ## Design Principles
//!
//! - Every read carries its own offset; no read depends on a previous one
//! - Clones are independent and start out closed
//! - Open-on-demand handles open lazily and release the descriptor after use
//! - Handles must be `Send + Sync`
//!
//! ## Available Handles
//!
//! - [`MemoryHandle`] - For testing and in-memory images
//! - [`FileHandle`] - For database files on disk
//!
//! ## Example
//!
//! ```rust
//! use longval_storage::{FileIo, MemoryHandle};
//!
//! let handle = MemoryHandle::new();
//! let offset = handle.append(b"hello world");
//! let data = handle.read_at(offset, 5).unwrap();
//! assert_eq!(&data, b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod io;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileHandle;
pub use io::FileIo;
pub use memory::MemoryHandle;
