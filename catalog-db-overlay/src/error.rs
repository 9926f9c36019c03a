//! Error types for the overlay crate

use thiserror::Error;

/// Result type for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur in overlay operations
#[derive(Error, Debug)]
pub enum OverlayError {
    /// No such overlay or created record
    #[error("Overlay record not found: {0}")]
    NotFound(String),

    /// Store could not be reached
    #[error("Overlay store unavailable: {0}")]
    Unavailable(String),

    /// Created-record id space exhausted or otherwise out of range
    #[error("Overlay id overflow: {0}")]
    Overflow(String),

    /// SQLite error
    #[error("Overlay storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Blocking task panicked or was cancelled
    #[error("Overlay task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl OverlayError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an overflow error
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }
}
