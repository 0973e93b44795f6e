//! Error types for waymark.

use thiserror::Error;

/// Result type alias using waymark's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for waymark operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Journey not found
    #[error("Journey not found: {0}")]
    JourneyNotFound(String),

    /// Thread not found
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Message not found within a thread
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Streaming chat generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
