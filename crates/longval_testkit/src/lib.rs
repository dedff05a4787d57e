//! # Longval Testkit
//!
//! Test utilities for the long value reader.
//!
//! This crate provides:
//! - Fixtures laying out long values in memory or in a temporary file
//! - Test doubles that count handle clones, closes, frees and reads, and
//!   fail on request
//! - A segment store wrapper that fails a chosen construction step
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use longval_testkit::prelude::*;
//! use longval_core::Ownership;
//!
//! let fixture = LongValueFixture::scenario();
//! let value = fixture.create(Ownership::Borrow).unwrap();
//! assert_eq!(value.segment_count(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
