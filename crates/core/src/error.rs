//! Error types for the tickday pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tickday pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Row-index persistence error (missing or unreadable index file).
    #[error("Index error: {0}")]
    Index(String),

    /// Row index and file contents disagree.
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Data error (ordering violation, invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// Processing was cancelled between chunks.
    #[error("Processing cancelled")]
    Cancelled,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Error::Index(msg.into())
    }

    /// Create a consistency error.
    pub fn consistency(msg: impl Into<String>) -> Self {
        Error::Consistency(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}
