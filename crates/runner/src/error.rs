//! Errors that abort a batch run.
//!
//! Per-entry generation failures are *not* represented here: the retry
//! controller turns them into inline error markers and the run continues.
//! Only persistence failures stop a run, because once a block cannot be written
//! the output no longer lines up with the input.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Fatal errors raised while writing output or the run log.
#[derive(Debug, Error)]
pub enum RunError {
    /// A file or directory could not be created or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing or flushing an output block failed.
    #[error("Failed to write output block {block}: {source}")]
    Output {
        /// 1-based index of the block that could not be written.
        block: usize,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The run log could not be serialised.
    #[error("Failed to serialise run log: {0}")]
    Serialization(#[from] serde_json::Error),
}
