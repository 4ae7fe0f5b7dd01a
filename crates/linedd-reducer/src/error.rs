//! Error types for the reducer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a reduction.
///
/// A candidate that does not reproduce the expected verdict is not an error;
/// the engine simply reverts that batch.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// Reading the input or writing a candidate/output file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The oracle command could not be started.
    #[error("failed to run oracle command `{program}`: {source}")]
    Spawn {
        /// The program that failed to launch.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The unmodified input does not reproduce the expected verdict.
    #[error(
        "verdict {actual} on {} does not match expected verdict {expected}, even though no changes were made",
        path.display()
    )]
    SanityCheck {
        /// The verdict the reduction is trying to preserve.
        expected: i32,
        /// The verdict the oracle actually returned.
        actual: i32,
        /// The file that was tested.
        path: PathBuf,
    },

    /// The active window does not fit the input.
    #[error("invalid line window [{first}, {last}) for input of {len} lines")]
    InvalidWindow {
        /// First removable line.
        first: usize,
        /// One past the last removable line.
        last: usize,
        /// Number of lines in the input.
        len: usize,
    },

    /// No oracle command was given.
    #[error("oracle command is empty")]
    EmptyCommand,
}

impl ReduceError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReduceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for reducer operations.
pub type Result<T> = std::result::Result<T, ReduceError>;
