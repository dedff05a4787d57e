//! Sequential access to a long value across segment boundaries.

use crate::long_value::LongValue;
use std::io::{self, Read, Seek, SeekFrom};

/// A [`Read`] + [`Seek`] view over a [`LongValue`].
///
/// Segments are fetched through the long value's cache, so reading the same
/// range twice does not hit the file twice while the segment stays cached.
#[derive(Debug)]
pub struct LongValueReader<'v, 'a> {
    value: &'v LongValue<'a>,
    position: u64,
}

impl<'v, 'a> LongValueReader<'v, 'a> {
    pub(crate) fn new(value: &'v LongValue<'a>) -> Self {
        Self { value, position: 0 }
    }

    /// Returns the current logical position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Read for LongValueReader<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let Some(index) = self.value.block.index_of(self.position) else {
            return Ok(0);
        };
        let Some(descriptor) = self.value.block.get(index) else {
            return Ok(0);
        };

        let data = self.value.segment_data(index).map_err(io::Error::other)?;
        let start = (self.position - u64::from(descriptor.value_offset)) as usize;
        let available = &data[start..];
        let len = available.len().min(buf.len());

        buf[..len].copy_from_slice(&available[..len]);
        self.position += len as u64;
        Ok(len)
    }
}

impl Seek for LongValueReader<'_, '_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(offset);
            }
            SeekFrom::End(delta) => (self.value.data_size(), delta),
            SeekFrom::Current(delta) => (self.position, delta),
        };

        let position = base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        self.position = position;
        Ok(position)
    }
}
