//! # Longval Core
//!
//! Reassembly of long values from an extensible-storage database file.
//!
//! A long value (a large BLOB or text column value) is stored outside its
//! record as a root record plus a chain of segment records in the table's
//! long-values tree. This crate walks that chain, records where each segment
//! lives, and serves the segment bytes lazily through a bounded cache.
//!
//! ## Layers
//!
//! - [`LongValueId`] derives the root key and segment keys
//! - [`SegmentStore`] is the keyed tree the chain is looked up in
//! - [`SegmentChain`] walks segment keys until one is missing
//! - [`SegmentBlock`] and [`SegmentCache`] hold descriptors and cached bytes
//! - [`FileHandleOwner`] holds the file handle as borrowed or owned
//! - [`LongValue`] ties them together
//!
//! ## Example
//!
//! ```rust
//! use longval_core::{Config, LongValue, LongValueId, MemorySegmentStore, Ownership};
//! use longval_storage::MemoryHandle;
//!
//! let handle = MemoryHandle::new();
//! let id = LongValueId::from_bytes([0, 0, 0, 1]);
//! let mut store = MemorySegmentStore::new();
//! store.write_long_value(&handle, id, &[vec![0xaa; 4096], vec![0xbb; 512]]).unwrap();
//!
//! let value = LongValue::create(
//!     &store, &(), &(), &handle, id.as_bytes(), Ownership::CloneAndOwn, &Config::default(),
//! ).unwrap();
//!
//! assert_eq!(value.segment_count(), 2);
//! assert_eq!(value.segment_data(1).unwrap().len(), 512);
//! value.release().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod block;
mod chain;
mod config;
mod error;
mod handle;
mod key;
mod long_value;
mod store;

pub use block::{CacheStats, SegmentBlock, SegmentCache, SegmentDescriptor};
pub use chain::{ChainLink, SegmentChain};
pub use config::{Config, DEFAULT_CACHE_CAPACITY};
pub use error::{CoreError, CoreResult};
pub use handle::{FileHandleOwner, Ownership, FLAG_MANAGED_FILE_IO_HANDLE};
pub use key::{LongValueId, LONG_VALUE_ID_SIZE, SEGMENT_KEY_SIZE};
pub use long_value::{release, LongValue, LongValueReader};
pub use store::{KeyMode, MemoryRecord, MemorySegmentStore, RootInfo, SegmentRecord, SegmentStore};
