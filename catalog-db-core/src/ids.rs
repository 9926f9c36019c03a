//! Record identifiers.
//!
//! Archive-derived records and records created inside the catalog share one
//! numeric space split into two disjoint ranges, so a bare id is never
//! ambiguous about where its base version lives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First id handed out to created (synthesized) records.
///
/// Archive ingestion assigns ids sequentially from 1 and must stay below this.
pub const CREATED_ID_BASE: u64 = 1_000_000_000_000;

/// Stable identifier of a catalog record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const fn new(raw: u64) -> Self {
        RecordId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// True when the id belongs to the created-record range.
    pub const fn is_created(self) -> bool {
        self.0 >= CREATED_ID_BASE
    }

    /// True when the id can have an archive index entry.
    pub const fn is_archival(self) -> bool {
        self.0 > 0 && self.0 < CREATED_ID_BASE
    }

    /// SQLite stores integers as i64.
    pub fn as_i64(self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }

    pub fn from_i64(raw: i64) -> Self {
        RecordId(u64::try_from(raw).unwrap_or(0))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        RecordId(raw)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RecordId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_disjoint() {
        assert!(RecordId(1).is_archival());
        assert!(!RecordId(1).is_created());
        assert!(RecordId(CREATED_ID_BASE).is_created());
        assert!(!RecordId(CREATED_ID_BASE).is_archival());
        assert!(!RecordId(0).is_archival());
    }

    #[test]
    fn parses_and_displays() {
        let id: RecordId = " 42 ".parse().unwrap();
        assert_eq!(id, RecordId(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(RecordId::from_i64(-1), RecordId(0));
    }
}
