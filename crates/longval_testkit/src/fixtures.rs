//! Long value fixtures.
//!
//! Provides ready-made long values laid out in a memory image or in a
//! temporary file, together with the bytes they are expected to reassemble to.

use longval_core::{Config, CoreResult, LongValue, LongValueId, MemorySegmentStore, Ownership};
use longval_storage::{FileHandle, MemoryHandle};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Identifier used by the reference scenario.
pub const SCENARIO_ID: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Segment sizes of the reference scenario.
pub const SCENARIO_SEGMENT_SIZES: [usize; 2] = [4096, 512];

/// Bytes written in front of the first segment so file offsets are non-zero.
const IMAGE_PREAMBLE: &[u8] = b"ESE-IMAGE";

/// A long value written to an in-memory image.
pub struct LongValueFixture {
    /// The image holding the segment data.
    pub handle: MemoryHandle,
    /// The long-values tree.
    pub store: MemorySegmentStore,
    /// Identifier of the long value.
    pub id: LongValueId,
    /// Segment contents in logical order.
    pub segments: Vec<Vec<u8>>,
}

impl LongValueFixture {
    /// Creates a fixture with segments of the given sizes.
    ///
    /// Segment bytes are derived from the segment index and byte position so
    /// a misplaced segment is detectable.
    pub fn new(id: LongValueId, sizes: &[usize]) -> Self {
        let segments = sizes
            .iter()
            .enumerate()
            .map(|(index, &size)| pattern(index, size))
            .collect();
        Self::with_segments(id, segments)
    }

    /// Creates a fixture from explicit segment contents.
    pub fn with_segments(id: LongValueId, segments: Vec<Vec<u8>>) -> Self {
        let handle = MemoryHandle::new();
        handle.append(IMAGE_PREAMBLE);

        let mut store = MemorySegmentStore::new();
        store
            .write_long_value(&handle, id, &segments)
            .expect("Failed to write long value");

        Self {
            handle,
            store,
            id,
            segments,
        }
    }

    /// The reference two-segment long value: 4096 + 512 bytes.
    pub fn scenario() -> Self {
        Self::new(LongValueId::from_bytes(SCENARIO_ID), &SCENARIO_SEGMENT_SIZES)
    }

    /// Assembles the long value with the default configuration.
    pub fn create(&self, ownership: Ownership) -> CoreResult<LongValue<'_>> {
        self.create_with(ownership, &Config::default())
    }

    /// Assembles the long value with `config`.
    pub fn create_with(&self, ownership: Ownership, config: &Config) -> CoreResult<LongValue<'_>> {
        LongValue::create(
            &self.store,
            &(),
            &(),
            &self.handle,
            self.id.as_bytes(),
            ownership,
            config,
        )
    }

    /// Returns the bytes the long value should reassemble to.
    pub fn expected_data(&self) -> Vec<u8> {
        self.segments.concat()
    }

    /// Returns the expected logical offset of every segment.
    pub fn expected_offsets(&self) -> Vec<u32> {
        let mut offset = 0u32;
        self.segments
            .iter()
            .map(|segment| {
                let start = offset;
                offset += segment.len() as u32;
                start
            })
            .collect()
    }
}

/// A long value fixture backed by a temporary file.
pub struct FileFixture {
    /// The in-memory layout that was written to disk.
    pub fixture: LongValueFixture,
    /// Handle on the file, opened eagerly.
    pub handle: FileHandle,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl FileFixture {
    /// Writes `fixture`'s image to a temporary file and opens it.
    pub fn from_fixture(fixture: LongValueFixture) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("long_values.edb");

        let mut file = std::fs::File::create(&path).expect("Failed to create image file");
        file.write_all(&fixture.handle.data())
            .expect("Failed to write image file");
        file.sync_all().expect("Failed to sync image file");

        let handle = FileHandle::open(&path).expect("Failed to open image file");

        Self {
            fixture,
            handle,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the path of the image file.
    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    /// Assembles the long value reading through the file handle.
    pub fn create(&self, ownership: Ownership) -> CoreResult<LongValue<'_>> {
        LongValue::create(
            &self.fixture.store,
            &(),
            &(),
            &self.handle,
            self.fixture.id.as_bytes(),
            ownership,
            &Config::default(),
        )
    }
}

/// Runs `f` with the reference scenario.
pub fn with_scenario<F, R>(f: F) -> R
where
    F: FnOnce(&LongValueFixture) -> R,
{
    let fixture = LongValueFixture::scenario();
    f(&fixture)
}

fn pattern(index: usize, size: usize) -> Vec<u8> {
    (0..size)
        .map(|position| (index.wrapping_mul(31).wrapping_add(position) % 251) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_layout() {
        let fixture = LongValueFixture::scenario();
        assert_eq!(fixture.expected_offsets(), vec![0, 4096]);
        assert_eq!(fixture.expected_data().len(), 4608);
        // Root plus two segments.
        assert_eq!(fixture.store.len(), 3);
    }

    #[test]
    fn segments_differ() {
        let fixture = LongValueFixture::new(LongValueId::from_bytes([1, 1, 1, 1]), &[8, 8]);
        assert_ne!(fixture.segments[0], fixture.segments[1]);
    }

    #[test]
    fn file_fixture_writes_image() {
        let file = FileFixture::from_fixture(LongValueFixture::scenario());
        assert!(file.path().exists());
        assert_eq!(
            std::fs::read(file.path()).unwrap(),
            file.fixture.handle.data()
        );
    }
}
