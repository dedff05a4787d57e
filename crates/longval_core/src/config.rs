//! Long value reader configuration.

/// Default number of segment buffers cached per long value.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Configuration for assembling long values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of materialized segment buffers kept per long value.
    pub cache_capacity: usize,

    /// Number of segment descriptors reserved when the block is created.
    pub segment_capacity_hint: usize,

    /// Whether to compare the reassembled size against the root record.
    pub verify_data_size: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            segment_capacity_hint: 0,
            verify_data_size: false, // trust the chain
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets the number of descriptors reserved up front.
    #[must_use]
    pub const fn segment_capacity_hint(mut self, hint: usize) -> Self {
        self.segment_capacity_hint = hint;
        self
    }

    /// Sets whether to verify the reassembled size against the root record.
    #[must_use]
    pub const fn verify_data_size(mut self, value: bool) -> Self {
        self.verify_data_size = value;
        self
    }
}
