//! # Design
//!
//! - Constant messages; the operation and path involved live in fields.
//! - Converted into `SubmitError::Failed` at the backend boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for watch-folder operations.
pub type BlackholeResult<T> = Result<T, BlackholeError>;

/// Errors produced while writing into the watch folder.
#[derive(Debug, Error)]
pub enum BlackholeError {
    /// IO failures while interacting with the watch folder.
    #[error("blackhole io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The blocking writer task panicked or was cancelled.
    #[error("blackhole writer task failed")]
    Join {
        /// Underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
}

impl BlackholeError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
