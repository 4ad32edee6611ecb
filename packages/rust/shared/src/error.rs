//! Error types for protomerge.
//!
//! Library crates use [`ProtomergeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all protomerge operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtomergeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Remote feed unreachable, timed out, or answered with a non-2xx status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Feed body is not JSON or its top level is not an array.
    #[error("feed parse error: {message}")]
    FeedParse { message: String },

    /// Manual entries file exists but could not be read or parsed.
    #[error("manual entries error at {path:?}: {message}")]
    ManualFileParse { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// One or more output files could not be written.
    #[error("failed to write {} output file(s): {}", failed.len(), failed.join(", "))]
    OutputWrite { failed: Vec<String> },

    /// Data validation error (bad input value, serialization failure, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProtomergeError>;

impl ProtomergeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a feed parse error from any displayable message.
    pub fn feed_parse(msg: impl Into<String>) -> Self {
        Self::FeedParse {
            message: msg.into(),
        }
    }

    /// Create a manual-file error for the given path.
    pub fn manual_file(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ManualFileParse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should end the run.
    ///
    /// Manual-file problems are recovered by the caller; everything else is terminal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ManualFileParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProtomergeError::config("bad min_size");
        assert_eq!(err.to_string(), "config error: bad min_size");

        let err = ProtomergeError::feed_parse("top-level value is an object");
        assert!(err.to_string().contains("top-level value is an object"));
    }

    #[test]
    fn output_write_lists_every_failure() {
        let err = ProtomergeError::OutputWrite {
            failed: vec!["lending".into(), "dexes".into()],
        };
        assert_eq!(
            err.to_string(),
            "failed to write 2 output file(s): lending, dexes"
        );
    }

    #[test]
    fn only_manual_file_errors_are_recoverable() {
        assert!(!ProtomergeError::manual_file("input.json", "eof").is_fatal());
        assert!(ProtomergeError::Fetch("timeout".into()).is_fatal());
        assert!(ProtomergeError::feed_parse("not an array").is_fatal());
    }
}
