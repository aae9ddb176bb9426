//! Unified error type for the indexing engine.

use thiserror::Error;

/// All errors that can occur while indexing or serving queries.
#[derive(Error, Debug)]
pub enum IndexError {
    /// I/O error (file read, directory walk)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Glob pattern rejected by the doublestar dialect
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Invalid regular expression in a `/.../` query
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Requested path is not in the index
    #[error("file not found in index: {0}")]
    NotFound(String),

    /// Required request parameter is missing or empty
    #[error("missing required parameter: {0}")]
    EmptyParameter(&'static str),

    /// Content index rejected a file during ingestion
    #[error("indexing {path}: {message}")]
    IndexingFailed { path: String, message: String },

    /// File content contains a null byte in its first 512 bytes
    #[error("binary file")]
    BinaryFile,

    /// Filesystem watcher failure
    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Lock poisoned (a thread panicked while holding a lock)
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Invalid configuration at startup
    #[error("{0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = IndexError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_invalid_pattern_display() {
        let source = globset::Glob::new("a[").unwrap_err();
        let err = IndexError::InvalidPattern {
            pattern: "a[".to_string(),
            source,
        };
        assert!(err.to_string().contains("a["));
        assert!(err.to_string().contains("invalid glob pattern"));
    }

    #[test]
    fn test_invalid_regex_display() {
        let source = regex::Regex::new("[invalid").unwrap_err();
        let err = IndexError::InvalidRegex {
            pattern: "[invalid".to_string(),
            source,
        };
        assert!(err.to_string().contains("[invalid"));
    }

    #[test]
    fn test_not_found_display() {
        let err = IndexError::NotFound("src/main.go".to_string());
        assert!(err.to_string().contains("src/main.go"));
    }

    #[test]
    fn test_empty_parameter_display() {
        let err = IndexError::EmptyParameter("query");
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: IndexError = io_err.into();
        assert!(matches!(err, IndexError::Io(_)));
    }
}
