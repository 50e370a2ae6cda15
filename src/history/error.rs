//! History browser error handling.

use thiserror::Error;

/// Errors raised while querying git for history data.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The git process could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Git exited with a non-zero status.
    #[error("`{command}` failed: {stderr}")]
    QueryFailed {
        /// The command line that failed.
        command: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The commit count query returned something other than a number.
    #[error("Invalid commit count: {0:?}")]
    InvalidCount(String),
}
