//! Record resolution across overlay, created and archival layers.
//!
//! ```text
//! resolve(id, include_edits = true)
//!   1. overlay latest(id)      ── hit → decode, done
//!   2. created(id)             ── hit → decode, done
//!   3. cache(id)               ── hit → done
//!   4. index.locate(id) → archive seek/read → decode → cache
//!
//! resolve(id, include_edits = false)  skips 1 and 2 entirely
//! ```
//!
//! Overlay precedence is absolute: when an overlay row exists the archive is
//! never consulted. The cache holds archival parses only.

use crate::error::{ApiError, Result};
use catalog_db_archive::{ArchiveError, ArchiveIndex, ArchiveReader, RecordCache};
use catalog_db_core::{codec, CatalogRecord, Identifier, RecordId};
use catalog_db_overlay::OverlayStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which layer produced a resolved record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Overlay,
    Created,
    Archive,
    Cache,
}

/// A resolved record together with its provenance.
#[derive(Clone, Debug, Serialize)]
pub struct Resolved {
    pub id: RecordId,
    pub record: CatalogRecord,
    pub source: RecordSource,
}

/// Composes archive index, archive reader, overlay store and parse cache.
///
/// Constructed once and shared; every collaborator is injected.
#[derive(Debug, Clone)]
pub struct RecordResolver {
    index: Arc<dyn ArchiveIndex>,
    reader: ArchiveReader,
    overlay: Arc<dyn OverlayStore>,
    cache: Arc<RecordCache>,
}

impl RecordResolver {
    pub fn new(
        index: Arc<dyn ArchiveIndex>,
        reader: ArchiveReader,
        overlay: Arc<dyn OverlayStore>,
        cache: Arc<RecordCache>,
    ) -> Self {
        Self {
            index,
            reader,
            overlay,
            cache,
        }
    }

    pub fn index(&self) -> &Arc<dyn ArchiveIndex> {
        &self.index
    }

    pub fn overlay(&self) -> &Arc<dyn OverlayStore> {
        &self.overlay
    }

    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    /// Authoritative current record for `id`.
    pub async fn resolve(&self, id: RecordId, include_edits: bool) -> Result<CatalogRecord> {
        Ok(self.resolve_with_source(id, include_edits).await?.record)
    }

    pub async fn resolve_with_source(&self, id: RecordId, include_edits: bool) -> Result<Resolved> {
        if include_edits {
            if let Some(row) = self.overlay.get_latest(id).await? {
                debug!(record_id = %id, seq = row.seq, "resolved from overlay");
                let record = decode_payload(id, &row.payload)?;
                return Ok(Resolved {
                    id,
                    record,
                    source: RecordSource::Overlay,
                });
            }
            if let Some(created) = self.overlay.get_created(id).await? {
                debug!(record_id = %id, "resolved created record");
                let record = decode_payload(id, &created.payload)?;
                return Ok(Resolved {
                    id,
                    record,
                    source: RecordSource::Created,
                });
            }
        }

        let (record, source) = self.resolve_archival(id).await?;
        Ok(Resolved {
            id,
            record: (*record).clone(),
            source,
        })
    }

    async fn resolve_archival(&self, id: RecordId) -> Result<(Arc<CatalogRecord>, RecordSource)> {
        if let Some(hit) = self.cache.get(id) {
            debug!(record_id = %id, "archive cache hit");
            return Ok((hit, RecordSource::Cache));
        }
        if id.is_created() {
            return Err(ApiError::not_found(format!("record {id}")));
        }

        let index = Arc::clone(&self.index);
        let reader = self.reader.clone();
        let read = tokio::task::spawn_blocking(move || {
            let location = index.locate(id)?;
            debug!(
                record_id = %id,
                archive = %location.archive_file,
                offset = location.byte_offset,
                len = location.byte_length,
                "reading archived record"
            );
            reader.read_record(&location)
        })
        .await
        .map_err(|e| ApiError::internal(format!("archive read task failed: {e}")))?;

        match read {
            Ok(record) => {
                let record = Arc::new(record);
                self.cache.insert(id, Arc::clone(&record));
                Ok((record, RecordSource::Archive))
            }
            Err(e) => Err(archive_error(id, e)),
        }
    }

    /// Find a record by an identifier embedded in it.
    ///
    /// Overlay and created records are scanned first, then the archive index
    /// secondary keys. Archive hits go back through [`resolve`](Self::resolve)
    /// so an overlay edit still wins.
    pub async fn resolve_by_external_identifier(
        &self,
        external: &str,
    ) -> Result<(CatalogRecord, RecordId)> {
        let identifier = Identifier::parse(external)
            .ok_or_else(|| ApiError::bad_request(format!("unrecognized identifier: {external:?}")))?;

        if let Identifier::Local { id, .. } = &identifier {
            let record = self.resolve(*id, true).await?;
            return Ok((record, *id));
        }

        let mut shadowed = Vec::new();
        for current in self.overlay.scan_current().await? {
            match codec::decode(&current.payload) {
                Ok(record) if identifier.matches(&record) => {
                    debug!(record_id = %current.record_id, identifier = %identifier, "identifier matched overlay");
                    return Ok((record, current.record_id));
                }
                Ok(_) => shadowed.push(current.record_id),
                Err(e) => {
                    warn!(record_id = %current.record_id, error = %e, "skipping undecodable overlay payload");
                    shadowed.push(current.record_id);
                }
            }
        }

        let index = Arc::clone(&self.index);
        let lookup = identifier.clone();
        let hits = tokio::task::spawn_blocking(move || match &lookup {
            Identifier::Oclc { number } => index.find_by_oclc(number),
            Identifier::ControlNumber { number, .. } => index.find_by_control_number(number),
            Identifier::Local { .. } => Ok(Vec::new()),
        })
        .await
        .map_err(|e| ApiError::internal(format!("index lookup task failed: {e}")))??;

        // An edited record that no longer carries the identifier does not match.
        match hits.into_iter().find(|id| !shadowed.contains(id)) {
            Some(id) => {
                let record = self.resolve(id, true).await?;
                Ok((record, id))
            }
            None => Err(ApiError::not_found(format!("no record carries {identifier}"))),
        }
    }

    /// Encode `record` and append it as the current version of `id`.
    pub async fn save(&self, id: RecordId, record: &CatalogRecord, editor: &str) -> Result<()> {
        let bytes = codec::encode(record)?;
        let row = self.overlay.save(id, &bytes, editor).await?;
        debug!(record_id = %id, seq = row.seq, editor, "record saved to overlay");
        Ok(())
    }

    /// Encode `record` and store it under a freshly allocated created id.
    pub async fn create(&self, record: &CatalogRecord, creator: &str) -> Result<RecordId> {
        let bytes = codec::encode(record)?;
        let id = self.overlay.create(&bytes, creator).await?;
        debug!(record_id = %id, creator, "created record stored");
        Ok(id)
    }
}

/// A payload that no longer decodes is reported as absent for that id.
fn decode_payload(id: RecordId, payload: &[u8]) -> Result<CatalogRecord> {
    codec::decode(payload).map_err(|e| {
        warn!(record_id = %id, error = %e, "stored record does not decode");
        ApiError::not_found(format!("record {id} is unreadable: {e}"))
    })
}

fn archive_error(id: RecordId, err: ArchiveError) -> ApiError {
    match err {
        e if e.is_not_found() => ApiError::not_found(format!("record {id}: {e}")),
        ArchiveError::Decode(e) => {
            warn!(record_id = %id, error = %e, "archived record does not decode");
            ApiError::not_found(format!("record {id} is unreadable: {e}"))
        }
        ArchiveError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            warn!(record_id = %id, error = %e, "archived record is truncated");
            ApiError::not_found(format!("record {id} is unreadable: {e}"))
        }
        e => ApiError::Archive(e),
    }
}
