use std::io;

use thiserror::Error;

/// Error type for source loading failures.
///
/// These never cross the [`crate::DataStore`] boundary: the store logs them
/// and degrades to an empty table so dashboard consumers always render.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The source path does not exist or cannot be read.
    #[error("source file '{path}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Path as requested by the caller.
        path: String,
        /// Underlying filesystem error.
        reason: String,
    },
    /// The file was read but its delimited structure cannot be parsed.
    #[error("source file '{path}' is malformed: {details}")]
    Malformed {
        /// Path as requested by the caller.
        path: String,
        /// Parser diagnostic.
        details: String,
    },
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}
