//! Error types for converge core.

use thiserror::Error;

/// Probe output could not be read as an lsblk device list.
///
/// Distinct from a content mismatch. Pollers treat it as transient: output
/// captured mid-boot is often truncated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("probe output is empty")]
    Empty,

    #[error("probe output truncated at line {line} column {column}")]
    Truncated { line: usize, column: usize },

    #[error("probe output is not valid JSON at line {line} column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("probe output has unexpected shape: {message}")]
    Shape { message: String },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match e.classify() {
            Category::Eof => DecodeError::Truncated {
                line: e.line(),
                column: e.column(),
            },
            Category::Data => DecodeError::Shape {
                message: e.to_string(),
            },
            Category::Syntax | Category::Io => DecodeError::Syntax {
                message: e.to_string(),
                line: e.line(),
                column: e.column(),
            },
        }
    }
}
