//! Error types for threadkb.
//!
//! Library crates use [`ThreadKbError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Note that the reconciliation engine itself never surfaces these: catalog
//! failures are downgraded to the create-new path by the planner. Only
//! configuration and publishing errors reach the caller.

use std::path::PathBuf;

/// Top-level error type for all threadkb operations.
#[derive(Debug, thiserror::Error)]
pub enum ThreadKbError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Article catalog could not be listed or read.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad source link, empty candidate, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The publishing collaborator failed to write the plan.
    #[error("publish error: {0}")]
    Publish(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ThreadKbError>;

impl ThreadKbError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a catalog error from any displayable message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a publish error from any displayable message.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ThreadKbError::config("missing kb dir");
        assert_eq!(err.to_string(), "config error: missing kb dir");

        let err = ThreadKbError::catalog("git ls-tree exited with 128");
        assert!(err.to_string().starts_with("catalog error:"));

        let err = ThreadKbError::validation("source link 'nope' is not a URL");
        assert!(err.to_string().contains("not a URL"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ThreadKbError::io("/tmp/kb/redis-ha.md", source);
        assert!(err.to_string().contains("redis-ha.md"));
    }
}
