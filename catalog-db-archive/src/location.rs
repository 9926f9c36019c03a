//! Index entry types.

use catalog_db_core::{descriptive, identifiers, CatalogRecord, RecordId};
use serde::{Deserialize, Serialize};

/// Physical location of one record inside an archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLocation {
    /// Archive file name, relative to the records directory
    pub archive_file: String,
    /// Data file inside the archive
    pub inner_file: String,
    /// Start of the record in the decompressed inner file
    pub byte_offset: u64,
    /// Encoded length, taken from the record's own length prefix
    pub byte_length: u64,
}

/// Lookup keys recorded alongside each location at build time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryKeys {
    pub sudoc: Option<String>,
    pub title: Option<String>,
    pub oclc: Option<String>,
    pub control_number: Option<String>,
}

impl SecondaryKeys {
    pub fn from_record(record: &CatalogRecord) -> Self {
        Self {
            sudoc: descriptive::sudoc(record),
            title: descriptive::index_title(record),
            oclc: identifiers::oclc_number(record),
            control_number: identifiers::control_number(record),
        }
    }
}

/// One row of the archive index. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: RecordId,
    pub location: ArchiveLocation,
    pub keys: SecondaryKeys,
}

/// Search hit over the secondary keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub id: RecordId,
    pub sudoc: Option<String>,
    pub title: Option<String>,
    pub archive_file: String,
    pub oclc: Option<String>,
}

impl From<&IndexEntry> for IndexSummary {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            id: entry.id,
            sudoc: entry.keys.sudoc.clone(),
            title: entry.keys.title.clone(),
            archive_file: entry.location.archive_file.clone(),
            oclc: entry.keys.oclc.clone(),
        }
    }
}

/// Substring search over SuDoc number and title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub sudoc: Option<String>,
    pub title: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn sudoc(fragment: impl Into<String>) -> Self {
        Self {
            sudoc: Some(fragment.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, fragment: impl Into<String>) -> Self {
        self.title = Some(fragment.into());
        self
    }

    /// Case-insensitive substring test used by in-memory backends.
    pub fn matches(&self, keys: &SecondaryKeys) -> bool {
        fn contains(hay: Option<&String>, needle: Option<&String>) -> bool {
            match needle {
                None => true,
                Some(n) => hay
                    .map(|h| h.to_lowercase().contains(&n.to_lowercase()))
                    .unwrap_or(false),
            }
        }
        contains(keys.sudoc.as_ref(), self.sudoc.as_ref())
            && contains(keys.title.as_ref(), self.title.as_ref())
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            sudoc: None,
            title: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
