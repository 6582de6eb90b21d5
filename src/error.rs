//! Error types for STS
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StsError
pub type Result<T> = std::result::Result<T, StsError>;

/// Unified error type for STS operations
#[derive(Debug, Error)]
pub enum StsError {
    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// Malformed ingestion payload (missing or invalid fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Value outside the encodable bounds of the record format
    #[error("Range error: {0}")]
    Range(String),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// Corrupt or unsupported binary payload
    #[error("Format error: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Listener Errors
    // -------------------------------------------------------------------------
    /// Raised by a reading listener; contained by the engine
    #[error("Listener error: {0}")]
    Listener(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StsError {
    fn from(err: serde_json::Error) -> Self {
        StsError::Serialization(err.to_string())
    }
}
