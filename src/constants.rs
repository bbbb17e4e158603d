/// Constants used by the CSV source loader.
pub mod loader {
    /// Rows accumulated per parse chunk before flushing into the table.
    pub const DEFAULT_CHUNK_SIZE: usize = 100_000;
    /// Emit a progress log line every this many completed chunks.
    pub const PROGRESS_LOG_EVERY_CHUNKS: usize = 10;
}

/// Constants used by the memoization cache.
pub mod cache {
    /// Default bound on memoized filter results before FIFO eviction.
    pub const DEFAULT_CAPACITY: usize = 50;
}

/// Constants used by deterministic chart sampling.
pub mod sampling {
    /// Fixed RNG seed so repeated sampling calls are reproducible.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default target row count for chart consumers.
    pub const DEFAULT_CHART_SAMPLE_SIZE: usize = 100_000;
    /// Stratified sampling engages when the subset exceeds
    /// `STRATIFY_THRESHOLD_FACTOR * target` rows and a year column exists.
    pub const STRATIFY_THRESHOLD_FACTOR: usize = 2;
}
