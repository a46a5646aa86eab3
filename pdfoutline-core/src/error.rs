//! Error types for the outline engine.

use std::io;
use thiserror::Error;

/// Result type alias for outline operations.
pub type Result<T> = std::result::Result<T, OutlineError>;

#[derive(Error, Debug)]
pub enum OutlineError {
    /// I/O error when reading input spans or config files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Span dump or stage output is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid YAML for `OutlineConfig`.
    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A heuristic pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Extracted content cannot be classified (malformed spans, bad pages).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No preprocessor accepts this file.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// The optional semantic classifier failed.
    #[error("Semantic classifier error: {0}")]
    Semantic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OutlineError::InvalidInput("span 3 has no page".to_string());
        assert_eq!(err.to_string(), "Invalid input: span 3 has no page");

        let err = OutlineError::UnsupportedFormat("report.docx".to_string());
        assert_eq!(err.to_string(), "Unsupported input format: report.docx");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OutlineError = io_err.into();
        assert!(matches!(err, OutlineError::Io(_)));
    }
}
