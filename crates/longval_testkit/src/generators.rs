//! Property-based test generators using proptest.
//!
//! Provides strategies for identifiers, segment layouts and malformed
//! construction inputs.

use longval_core::{LongValueId, FLAG_MANAGED_FILE_IO_HANDLE, LONG_VALUE_ID_SIZE};
use proptest::prelude::*;

/// Strategy for generating long value IDs.
pub fn long_value_id_strategy() -> impl Strategy<Value = LongValueId> {
    any::<[u8; LONG_VALUE_ID_SIZE]>().prop_map(LongValueId::from_bytes)
}

/// Strategy for generating segment size lists.
///
/// Sizes are non-zero; the list may be empty (a long value with no segments).
pub fn segment_sizes_strategy(max_segments: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..2048, 0..=max_segments)
}

/// Strategy for generating explicit segment contents.
pub fn segments_strategy(max_segments: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..512), 0..=max_segments)
}

/// Strategy for generating identifier slices of any length but four.
pub fn invalid_id_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..16)
        .prop_filter("length must differ from the ID size", |bytes| {
            bytes.len() != LONG_VALUE_ID_SIZE
        })
}

/// Strategy for generating flag bytes with at least one unknown bit set.
pub fn invalid_flags_strategy() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("must carry an unknown bit", |flags| {
        flags & !FLAG_MANAGED_FILE_IO_HANDLE != 0
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
