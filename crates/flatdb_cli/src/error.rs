//! CLI error types.

use flatdb_core::CoreError;
use std::io;
use thiserror::Error;

/// Errors reported by the `flatdb` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command needs `--path`.
    #[error("a data directory is required for {0} (use --path)")]
    MissingPath(&'static str),

    /// The store failed to open or to answer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading a backing file failed.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File being read.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// JSON output could not be produced.
    #[error("cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `verify` found problems.
    #[error("verification failed with {0} problem(s)")]
    Verification(usize),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
