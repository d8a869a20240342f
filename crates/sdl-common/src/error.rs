//! Error types for SDL

use thiserror::Error;

/// Result type alias for SDL operations
pub type Result<T> = std::result::Result<T, SdlError>;

/// Main error type for SDL
#[derive(Error, Debug)]
pub enum SdlError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for environment variable {name}: {reason}")]
    InvalidVar { name: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SdlError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
