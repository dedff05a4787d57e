//! Long value identifiers and the keys derived from them.
//!
//! A long value owns two disjoint regions of the long-values tree:
//!
//! ```text
//! root:     | id reversed (4) |                      looked up in reversed-key mode
//! segment:  | id (4)          | offset, LE u32 (4) | looked up in natural mode
//! ```

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Size in bytes of a long value identifier.
pub const LONG_VALUE_ID_SIZE: usize = 4;

/// Size in bytes of a segment key.
pub const SEGMENT_KEY_SIZE: usize = 8;

/// Identifier of a long value within its table.
///
/// Long value IDs are opaque 4-byte values taken from the record that
/// references the long value. They are immutable once read.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LongValueId([u8; LONG_VALUE_ID_SIZE]);

impl LongValueId {
    /// Creates a long value ID from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; LONG_VALUE_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a long value ID from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedValue`] if the slice is not exactly
    /// four bytes. Wider identifiers are never truncated.
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; LONG_VALUE_ID_SIZE] = slice.try_into().map_err(|_| {
            CoreError::unsupported_value(format!(
                "unsupported long value key size: {}",
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; LONG_VALUE_ID_SIZE] {
        &self.0
    }

    /// Returns the key of the root record, the identifier byte-reversed.
    #[must_use]
    pub const fn root_key(&self) -> [u8; LONG_VALUE_ID_SIZE] {
        let [a, b, c, d] = self.0;
        [d, c, b, a]
    }

    /// Returns the key of the segment starting at `offset`.
    #[must_use]
    pub fn segment_key(&self, offset: u32) -> [u8; SEGMENT_KEY_SIZE] {
        let mut key = [0u8; SEGMENT_KEY_SIZE];
        key[..LONG_VALUE_ID_SIZE].copy_from_slice(&self.0);
        key[LONG_VALUE_ID_SIZE..].copy_from_slice(&offset.to_le_bytes());
        key
    }
}

impl fmt::Debug for LongValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LongValueId({self})")
    }
}

impl fmt::Display for LongValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; LONG_VALUE_ID_SIZE]> for LongValueId {
    fn from(bytes: [u8; LONG_VALUE_ID_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for LongValueId {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> CoreResult<Self> {
        Self::from_slice(slice)
    }
}
