//! Error types for catalog-db-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-format failures raised by the field codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes than a leader needs
    #[error("record too short: {0} bytes")]
    TooShort(usize),

    /// Leader length or base address is not a decimal number
    #[error("invalid leader: {0}")]
    InvalidLeader(String),

    /// The record declares more bytes than were supplied
    #[error("declared length {declared} exceeds available {available} bytes")]
    Truncated { declared: usize, available: usize },

    /// Directory is malformed or not terminated
    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    /// A directory entry points outside the record body
    #[error("field {tag} at {start}+{len} lies outside the record")]
    FieldOutOfBounds { tag: String, start: usize, len: usize },

    /// Tag is not three ASCII alphanumerics
    #[error("invalid tag: {0:?}")]
    InvalidTag(String),

    /// Field content contains a reserved delimiter byte
    #[error("field {tag} contains a reserved delimiter byte")]
    ReservedByte { tag: String },

    /// Encoded field or record exceeds the wire format's width limits
    #[error("{0} exceeds the wire format size limit")]
    TooLarge(String),
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed wire data
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid field content supplied by a caller
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid field error
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        Error::InvalidField(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
