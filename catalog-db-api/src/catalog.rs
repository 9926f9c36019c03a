//! The `Catalog` facade: one resolver plus the configuration every
//! operation needs.

use crate::boundwith::{BoundwithLinker, HoldingsData, LinkOptions, LinkOutcome};
use crate::config::CatalogConfig;
use crate::error::{ApiError, Result};
use crate::fields::{self, FieldInput, FieldOrder, FieldView};
use crate::relationship::{self, Relationship};
use crate::resolver::{RecordResolver, Resolved};
use crate::synth::{self, HostMetadata, Preview, SynthesisOptions, SynthesisOutcome};
use catalog_db_archive::{
    ArchiveIndex, ArchiveReader, IndexSummary, IngestReport, RecordCache, SearchQuery,
    SqliteArchiveIndex,
};
use catalog_db_core::{codec, CatalogRecord, RecordId};
use catalog_db_overlay::{OverlayRecord, OverlayStore, SqliteOverlayStore};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Concatenated MARC output of [`Catalog::export`].
#[derive(Clone, Debug, Default)]
pub struct Export {
    pub data: Vec<u8>,
    pub written: Vec<RecordId>,
    pub skipped: Vec<RecordId>,
}

/// Index rebuild summary.
#[derive(Clone, Debug, Serialize)]
pub struct RebuildReport {
    #[serde(flatten)]
    pub ingest: IngestReport,
    pub indexed: u64,
}

/// Entry point over archive, overlay and cache.
#[derive(Debug, Clone)]
pub struct Catalog {
    resolver: RecordResolver,
    /// Present when the index is SQLite-backed and can be rebuilt in place
    rebuildable: Option<Arc<SqliteArchiveIndex>>,
    config: CatalogConfig,
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir).map_err(|e| {
            ApiError::config(format!("cannot create directory {}: {e}", dir.display()))
        }),
        _ => Ok(()),
    }
}

impl Catalog {
    /// Open the SQLite index and overlay named by `config`, creating them if
    /// they do not exist.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        ensure_parent(&config.index_path)?;
        ensure_parent(&config.overlay_path)?;

        let index = Arc::new(SqliteArchiveIndex::open(&config.index_path)?);
        let overlay: Arc<dyn OverlayStore> = Arc::new(SqliteOverlayStore::open(&config.overlay_path)?);
        let cache = Arc::new(RecordCache::new(config.cache_capacity));
        let reader = ArchiveReader::new(&config.records_dir);

        info!(
            index = %config.index_path.display(),
            overlay = %config.overlay_path.display(),
            records_dir = %config.records_dir.display(),
            cache_capacity = config.cache_capacity,
            "catalog opened"
        );

        let resolver = RecordResolver::new(index.clone(), reader, overlay, cache);
        Ok(Self {
            resolver,
            rebuildable: Some(index),
            config,
        })
    }

    /// Assemble a catalog from injected collaborators.
    pub fn from_parts(
        index: Arc<dyn ArchiveIndex>,
        overlay: Arc<dyn OverlayStore>,
        config: CatalogConfig,
    ) -> Self {
        let cache = Arc::new(RecordCache::new(config.cache_capacity));
        let reader = ArchiveReader::new(&config.records_dir);
        Self {
            resolver: RecordResolver::new(index, reader, overlay, cache),
            rebuildable: None,
            config,
        }
    }

    pub fn resolver(&self) -> &RecordResolver {
        &self.resolver
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            missing_child: self.config.link.missing_child,
            local_source: self.config.link.local_source.clone(),
            editor: self.config.editor.clone(),
        }
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            default_language: self.config.synthesis.default_language.clone(),
            cataloging_agency: self.config.synthesis.cataloging_agency.clone(),
            date_entered: None,
        }
    }

    // ========================================================================
    // Records
    // ========================================================================

    pub async fn resolve(&self, id: RecordId, include_edits: bool) -> Result<CatalogRecord> {
        self.resolver.resolve(id, include_edits).await
    }

    pub async fn resolve_with_source(&self, id: RecordId, include_edits: bool) -> Result<Resolved> {
        self.resolver.resolve_with_source(id, include_edits).await
    }

    pub async fn resolve_by_external_identifier(
        &self,
        external: &str,
    ) -> Result<(CatalogRecord, RecordId)> {
        self.resolver.resolve_by_external_identifier(external).await
    }

    pub async fn get_fields(
        &self,
        id: RecordId,
        include_edits: bool,
        order: FieldOrder,
    ) -> Result<Vec<FieldView>> {
        fields::get_fields(&self.resolver, id, include_edits, order).await
    }

    pub async fn update_field(
        &self,
        id: RecordId,
        index: usize,
        input: &FieldInput,
    ) -> Result<CatalogRecord> {
        fields::update_field(&self.resolver, id, index, input, &self.config.editor).await
    }

    pub async fn add_field(&self, id: RecordId, input: &FieldInput) -> Result<(CatalogRecord, usize)> {
        fields::add_field(&self.resolver, id, input, &self.config.editor).await
    }

    pub async fn delete_field(&self, id: RecordId, index: usize) -> Result<CatalogRecord> {
        fields::delete_field(&self.resolver, id, index, &self.config.editor).await
    }

    /// Every overlay version of `id`, oldest first.
    pub async fn history(&self, id: RecordId) -> Result<Vec<OverlayRecord>> {
        Ok(self.resolver.overlay().history(id).await?)
    }

    // ========================================================================
    // Boundwith
    // ========================================================================

    pub async fn link(
        &self,
        host_id: RecordId,
        child_ids: &[RecordId],
        holdings: Option<&HoldingsData>,
    ) -> Result<LinkOutcome> {
        BoundwithLinker::new(&self.resolver, self.link_options())
            .link(host_id, child_ids, holdings)
            .await
    }

    pub async fn synthesize_host(
        &self,
        title: &str,
        meta: &HostMetadata,
        child_ids: &[RecordId],
        holdings: Option<&HoldingsData>,
    ) -> Result<SynthesisOutcome> {
        synth::synthesize_host(
            &self.resolver,
            title,
            meta,
            child_ids,
            holdings,
            &self.synthesis_options(),
            &self.link_options(),
        )
        .await
    }

    pub async fn build_preview(&self, child_ids: &[RecordId]) -> Result<Preview> {
        synth::build_preview(
            &self.resolver,
            child_ids,
            &self.synthesis_options(),
            &self.link_options(),
        )
        .await
    }

    pub async fn lookup(&self, id: RecordId) -> Result<Relationship> {
        relationship::lookup(&self.resolver, id).await
    }

    // ========================================================================
    // Index
    // ========================================================================

    pub async fn search(&self, query: SearchQuery) -> Result<Vec<IndexSummary>> {
        let index = Arc::clone(self.resolver.index());
        let hits = tokio::task::spawn_blocking(move || index.search(&query))
            .await
            .map_err(|e| ApiError::internal(format!("search task failed: {e}")))??;
        Ok(hits)
    }

    /// Current versions of `ids` as one MARC file. Ids that do not resolve
    /// are left out.
    pub async fn export(&self, ids: &[RecordId]) -> Result<Export> {
        let mut out = Export::default();
        for &id in ids {
            let bytes = match self.resolver.resolve(id, true).await {
                Ok(record) => codec::encode(&record).map_err(ApiError::from),
                Err(e) => Err(e),
            };
            match bytes {
                Ok(bytes) => {
                    out.data.extend_from_slice(&bytes);
                    out.written.push(id);
                }
                Err(e) if e.is_client_error() => {
                    warn!(record_id = %id, error = %e, "skipping record in export");
                    out.skipped.push(id);
                }
                Err(e) => return Err(e),
            }
        }
        info!(written = out.written.len(), skipped = out.skipped.len(), "export finished");
        Ok(out)
    }

    /// Drop and rebuild the archive index from `records_dir`.
    pub async fn rebuild_index(&self) -> Result<RebuildReport> {
        let index = self.rebuildable.clone().ok_or_else(|| {
            ApiError::config("the archive index of this catalog cannot be rebuilt")
        })?;
        let records_dir = self.config.records_dir.clone();
        let (ingest, indexed) = tokio::task::spawn_blocking(move || {
            let report = index.rebuild(&records_dir)?;
            let indexed = index.len()?;
            Ok::<_, catalog_db_archive::ArchiveError>((report, indexed))
        })
        .await
        .map_err(|e| ApiError::internal(format!("index rebuild task failed: {e}")))??;

        // Ids are reassigned by a rebuild.
        self.resolver.cache().clear();
        Ok(RebuildReport { ingest, indexed })
    }
}
