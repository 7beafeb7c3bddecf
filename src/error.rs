//! Error types for the Trailhead client engine
//!
//! All errors use thiserror for structured error handling.
//! Network failures are caught at the call site and converted to one of
//! these kinds; none propagate as uncaught faults.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session initialization failed: {0}")]
    SessionInit(String),

    #[error("Load failed: {0}")]
    Load(String),

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Whether the error is worth retrying from a user-triggered action.
    /// Session bootstrap failures are terminal until the user re-initializes;
    /// everything else in this taxonomy is transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AppError::SessionInit(_) | AppError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
