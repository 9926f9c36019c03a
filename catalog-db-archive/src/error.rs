//! Error types for archive index operations.

use catalog_db_core::{CodecError, RecordId};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No index entry for the id
    #[error("record {0} is not in the archive index")]
    NotIndexed(RecordId),

    /// Archive file or inner data file missing
    #[error("archive member not found: {0}")]
    MissingMember(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("index store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Bytes at the indexed offset did not decode
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// Index would collide with the created-record id range
    #[error("index overflow: {0}")]
    Overflow(String),
}

impl ArchiveError {
    pub fn missing_member(msg: impl Into<String>) -> Self {
        Self::MissingMember(msg.into())
    }

    /// True for the "this id has no archival original" family.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotIndexed(_) | Self::MissingMember(_))
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
