//! Error types for the catalog API

use catalog_db_archive::ArchiveError;
use catalog_db_core::CodecError;
use catalog_db_overlay::OverlayError;
use thiserror::Error;

/// API error type that wraps errors from child crates
#[derive(Error, Debug)]
pub enum ApiError {
    /// Core errors
    #[error("Core error: {0}")]
    Core(#[from] catalog_db_core::Error),

    /// A record could not be encoded for persistence
    #[error("Encode error: {0}")]
    Codec(#[from] CodecError),

    /// Archive index or archive read errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Overlay store errors
    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field index outside the record
    #[error("Field index {index} is out of range; valid indexes are 0..{len}")]
    FieldIndexOutOfRange { index: usize, len: usize },

    /// Caller supplied field content that cannot be stored
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Request is well-formed but not acceptable
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    /// Create an invalid field error
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        ApiError::InvalidField(msg.into())
    }

    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ApiError::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    /// HTTP status code for error
    ///
    /// The API has no server layer; this is for consumers that put one in
    /// front of it, and for the CLI's exit classification.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::Archive(e) if e.is_not_found() => 404,
            ApiError::Core(catalog_db_core::Error::NotFound(_)) => 404,
            ApiError::Overlay(OverlayError::NotFound(_)) => 404,
            ApiError::FieldIndexOutOfRange { .. }
            | ApiError::InvalidField(_)
            | ApiError::BadRequest(_)
            | ApiError::Codec(_)
            | ApiError::Config(_) => 400,
            ApiError::Core(catalog_db_core::Error::InvalidField(_)) => 400,
            ApiError::Overlay(OverlayError::Unavailable(_)) => 503,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    /// True for errors the caller caused (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
