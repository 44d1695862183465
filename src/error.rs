//! Error types for tagalign.

use thiserror::Error;

/// Result type for tagalign operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tagalign operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Parse error (malformed label or record).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dataset loading/validation error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }
}
