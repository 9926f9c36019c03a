//! Overlay and created record rows.

use catalog_db_core::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One edit of a record. Rows are never mutated; the current version of an
/// id is the row with the highest `seq`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRecord {
    pub record_id: RecordId,
    /// Store-wide append sequence, strictly increasing
    pub seq: u64,
    /// Encoded record
    #[serde(skip)]
    pub payload: Vec<u8>,
    pub edited_at: DateTime<Utc>,
    pub editor: String,
}

/// A record minted inside the catalog (no archival original).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub record_id: RecordId,
    #[serde(skip)]
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub creator: String,
}

/// Current payload of an id that lives in the overlay store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentPayload {
    pub record_id: RecordId,
    pub payload: Vec<u8>,
    /// True when the payload is an edit, false for an unedited created record
    pub edited: bool,
}
