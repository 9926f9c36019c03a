//! Overlay store trait and the in-memory backend
//!
//! ## Operations
//!
//! - `save`: append a new version of a record (archival or created)
//! - `get_latest`: most recent version of an id, if any
//! - `history`: every version of an id, oldest first
//! - `create`: mint a new id in the created range and store its payload
//! - `get_created`: the payload a created id was minted with
//! - `scan_current`: current payload of every id the store knows about
//!
//! Writes are last-write-wins; there is no optimistic concurrency control.

use crate::error::{OverlayError, Result};
use crate::record::{CreatedRecord, CurrentPayload, OverlayRecord};
use async_trait::async_trait;
use catalog_db_core::{RecordId, CREATED_ID_BASE};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Append-only persistence for edited and created records.
#[async_trait]
pub trait OverlayStore: Debug + Send + Sync {
    /// Append a new version of `id`.
    async fn save(&self, id: RecordId, payload: &[u8], editor: &str) -> Result<OverlayRecord>;

    /// Latest version of `id`, or `None` if it was never edited.
    async fn get_latest(&self, id: RecordId) -> Result<Option<OverlayRecord>>;

    /// All versions of `id`, oldest first.
    async fn history(&self, id: RecordId) -> Result<Vec<OverlayRecord>>;

    /// Store a new record and return its freshly allocated id.
    async fn create(&self, payload: &[u8], creator: &str) -> Result<RecordId>;

    /// Original payload of a created record.
    async fn get_created(&self, id: RecordId) -> Result<Option<CreatedRecord>>;

    /// Current payload of every edited or created id, ascending by id.
    ///
    /// May be expensive; used for identifier scans.
    async fn scan_current(&self) -> Result<Vec<CurrentPayload>>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    edits: BTreeMap<RecordId, Vec<OverlayRecord>>,
    created: BTreeMap<RecordId, CreatedRecord>,
    next_seq: u64,
}

/// In-memory overlay store
///
/// Uses interior mutability so it can be shared behind `Arc<dyn OverlayStore>`.
#[derive(Debug, Default)]
pub struct MemoryOverlayStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions across all ids
    pub fn version_count(&self) -> usize {
        self.inner.read().edits.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl OverlayStore for MemoryOverlayStore {
    async fn save(&self, id: RecordId, payload: &[u8], editor: &str) -> Result<OverlayRecord> {
        let mut inner = self.inner.write();
        inner.next_seq += 1;
        let row = OverlayRecord {
            record_id: id,
            seq: inner.next_seq,
            payload: payload.to_vec(),
            edited_at: Utc::now(),
            editor: editor.to_string(),
        };
        inner.edits.entry(id).or_default().push(row.clone());
        Ok(row)
    }

    async fn get_latest(&self, id: RecordId) -> Result<Option<OverlayRecord>> {
        Ok(self
            .inner
            .read()
            .edits
            .get(&id)
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn history(&self, id: RecordId) -> Result<Vec<OverlayRecord>> {
        Ok(self
            .inner
            .read()
            .edits
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, payload: &[u8], creator: &str) -> Result<RecordId> {
        let mut inner = self.inner.write();
        let next = match inner.created.keys().next_back() {
            Some(last) => last
                .get()
                .checked_add(1)
                .ok_or_else(|| OverlayError::overflow("created id space exhausted"))?,
            None => CREATED_ID_BASE,
        };
        let id = RecordId(next);
        inner.created.insert(
            id,
            CreatedRecord {
                record_id: id,
                payload: payload.to_vec(),
                created_at: Utc::now(),
                creator: creator.to_string(),
            },
        );
        Ok(id)
    }

    async fn get_created(&self, id: RecordId) -> Result<Option<CreatedRecord>> {
        Ok(self.inner.read().created.get(&id).cloned())
    }

    async fn scan_current(&self) -> Result<Vec<CurrentPayload>> {
        let inner = self.inner.read();
        let mut out: BTreeMap<RecordId, CurrentPayload> = inner
            .created
            .values()
            .map(|c| {
                (
                    c.record_id,
                    CurrentPayload {
                        record_id: c.record_id,
                        payload: c.payload.clone(),
                        edited: false,
                    },
                )
            })
            .collect();
        for (id, versions) in &inner.edits {
            if let Some(last) = versions.last() {
                out.insert(
                    *id,
                    CurrentPayload {
                        record_id: *id,
                        payload: last.payload.clone(),
                        edited: true,
                    },
                );
            }
        }
        Ok(out.into_values().collect())
    }
}
