//! Archive index trait and the in-memory backend.
//!
//! The index maps a [`RecordId`] to the exact byte range of its record inside
//! an archive member. It is built once by the ingestion pass and is read-only
//! afterwards; a rebuild replaces it wholesale.

use crate::error::{ArchiveError, Result};
use crate::ingest::{ingest_dir, IngestReport};
use crate::location::{ArchiveLocation, IndexEntry, IndexSummary, SearchQuery};
use catalog_db_core::RecordId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

/// Keyed lookup from record id to archive location.
pub trait ArchiveIndex: Debug + Send + Sync {
    /// Location of `id`, or [`ArchiveError::NotIndexed`].
    fn locate(&self, id: RecordId) -> Result<ArchiveLocation>;

    /// Records whose 035 carries this normalized OCLC number, ascending.
    fn find_by_oclc(&self, number: &str) -> Result<Vec<RecordId>>;

    /// Records whose 001 equals `number`, ascending.
    fn find_by_control_number(&self, number: &str) -> Result<Vec<RecordId>>;

    /// Substring search over SuDoc number and title.
    fn search(&self, query: &SearchQuery) -> Result<Vec<IndexSummary>>;

    /// Number of indexed records.
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory index, used by tests and small collections.
#[derive(Debug, Default)]
pub struct MemoryArchiveIndex {
    entries: RwLock<BTreeMap<RecordId, IndexEntry>>,
}

impl MemoryArchiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let index = Self::new();
        {
            let mut map = index.entries.write();
            for entry in entries {
                map.insert(entry.id, entry);
            }
        }
        index
    }

    /// Build by running the ingestion pass over `records_dir`.
    pub fn build(records_dir: &Path) -> Result<(Self, IngestReport)> {
        let mut entries = Vec::new();
        let report = ingest_dir(records_dir, RecordId(1), &mut |entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok((Self::from_entries(entries), report))
    }

    pub fn insert(&self, entry: IndexEntry) {
        self.entries.write().insert(entry.id, entry);
    }

    pub fn entry(&self, id: RecordId) -> Option<IndexEntry> {
        self.entries.read().get(&id).cloned()
    }
}

impl ArchiveIndex for MemoryArchiveIndex {
    fn locate(&self, id: RecordId) -> Result<ArchiveLocation> {
        self.entries
            .read()
            .get(&id)
            .map(|e| e.location.clone())
            .ok_or(ArchiveError::NotIndexed(id))
    }

    fn find_by_oclc(&self, number: &str) -> Result<Vec<RecordId>> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|e| e.keys.oclc.as_deref() == Some(number))
            .map(|e| e.id)
            .collect())
    }

    fn find_by_control_number(&self, number: &str) -> Result<Vec<RecordId>> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|e| e.keys.control_number.as_deref() == Some(number))
            .map(|e| e.id)
            .collect())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<IndexSummary>> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|e| query.matches(&e.keys))
            .skip(query.offset)
            .take(query.limit)
            .map(IndexSummary::from)
            .collect())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.entries.read().len() as u64)
    }
}
