use crate::constants::cache::DEFAULT_CAPACITY;
use crate::constants::loader::DEFAULT_CHUNK_SIZE;
use crate::constants::sampling::{DEFAULT_CHART_SAMPLE_SIZE, DEFAULT_SEED};

/// Top-level configuration for the data core.
///
/// One instance is built at process startup and handed to [`crate::DataStore`];
/// nothing in the crate reads configuration from globals.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Rows parsed per chunk when loading the source file.
    pub chunk_size: usize,
    /// Bound on memoized filter results (FIFO eviction past this).
    pub capacity: usize,
    /// RNG seed controlling deterministic chart sampling.
    pub seed: u64,
    /// Default target size for chart-oriented sampling.
    pub chart_sample_size: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            capacity: DEFAULT_CAPACITY,
            seed: DEFAULT_SEED,
            chart_sample_size: DEFAULT_CHART_SAMPLE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Override the memoization cache capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the loader chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}
