//! Shared test harness for catalog-db-api integration tests.
//!
//! Builds real zip archives of encoded records in a temp directory, indexes
//! them with the ingestion pass, and wires a `Catalog` over in-memory stores.

// Helpers are used by some integration test crates but not others.
#![allow(dead_code)]

use async_trait::async_trait;
use catalog_db_api::{Catalog, CatalogConfig};
use catalog_db_archive::{IngestReport, MemoryArchiveIndex};
use catalog_db_core::{codec, CatalogRecord, Field, Indicators, RecordId, Tag};
use catalog_db_overlay::{
    CreatedRecord, CurrentPayload, MemoryOverlayStore, OverlayError, OverlayRecord, OverlayStore,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// Record builders
// =============================================================================

pub fn tag(t: &[u8; 3]) -> Tag {
    Tag::from_static(t)
}

/// A child-like record: 001, optional 035 OCLC, 086, 245 and a 264 year.
pub fn record(control: Option<&str>, oclc: Option<&str>, title: &str, year: Option<&str>) -> CatalogRecord {
    let mut rec = CatalogRecord::new();
    if let Some(control) = control {
        rec.push(Field::control(tag(b"001"), control));
    }
    if let Some(oclc) = oclc {
        rec.push(Field::data(tag(b"035"), Indicators::BLANK).subfield('a', format!("(OCoLC){oclc}")));
    }
    rec.push(Field::data(tag(b"086"), Indicators::new('0', ' ')).subfield('a', "C 3.1:990"));
    rec.push(Field::data(tag(b"245"), Indicators::new('1', '0')).subfield('a', title));
    if let Some(year) = year {
        rec.push(
            Field::data(tag(b"264"), Indicators::new(' ', '1'))
                .subfield('a', "Washington :")
                .subfield('b', "G.P.O.,")
                .subfield('c', year),
        );
    }
    rec
}

pub fn encode_all(records: &[CatalogRecord]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|r| codec::encode(r).unwrap())
        .collect()
}

/// Write `members` (name, raw bytes) into a zip at `dir/name`.
pub fn write_zip(dir: &Path, name: &str, members: &[(&str, Vec<u8>)]) {
    let file = std::fs::File::create(dir.join(name)).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (member, bytes) in members {
        zip.start_file(*member, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub dir: TempDir,
    pub catalog: Catalog,
    pub index: Arc<MemoryArchiveIndex>,
    pub report: IngestReport,
}

impl Harness {
    /// One archive `vol1.zip` with one member `records.mrc` holding `records`
    /// (ids 1..=n), over a memory overlay store.
    pub fn with_records(records: &[CatalogRecord]) -> Harness {
        Self::with_overlay(records, Arc::new(MemoryOverlayStore::new()))
    }

    pub fn with_overlay(records: &[CatalogRecord], overlay: Arc<dyn OverlayStore>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(records))]);
        Self::over_dir(dir, overlay)
    }

    /// Index whatever archives are already in `dir`.
    pub fn over_dir(dir: TempDir, overlay: Arc<dyn OverlayStore>) -> Harness {
        let (index, report) = MemoryArchiveIndex::build(dir.path()).unwrap();
        let index = Arc::new(index);
        let config = CatalogConfig {
            records_dir: dir.path().to_path_buf(),
            cache_capacity: 16,
            editor: "tester".to_string(),
            ..CatalogConfig::default()
        };
        let catalog = Catalog::from_parts(index.clone(), overlay, config);
        Harness {
            dir,
            catalog,
            index,
            report,
        }
    }

    pub fn with_config(mut self, f: impl FnOnce(&mut CatalogConfig)) -> Harness {
        let mut config = self.catalog.config().clone();
        f(&mut config);
        let overlay = Arc::clone(self.catalog.resolver().overlay());
        self.catalog = Catalog::from_parts(self.index.clone(), overlay, config);
        self
    }
}

// =============================================================================
// Overlay doubles
// =============================================================================

/// Overlay store that is down for every call.
#[derive(Debug, Default)]
pub struct UnavailableOverlay;

fn down<T>() -> catalog_db_overlay::Result<T> {
    Err(OverlayError::unavailable("connection refused"))
}

#[async_trait]
impl OverlayStore for UnavailableOverlay {
    async fn save(&self, _: RecordId, _: &[u8], _: &str) -> catalog_db_overlay::Result<OverlayRecord> {
        down()
    }
    async fn get_latest(&self, _: RecordId) -> catalog_db_overlay::Result<Option<OverlayRecord>> {
        down()
    }
    async fn history(&self, _: RecordId) -> catalog_db_overlay::Result<Vec<OverlayRecord>> {
        down()
    }
    async fn create(&self, _: &[u8], _: &str) -> catalog_db_overlay::Result<RecordId> {
        down()
    }
    async fn get_created(&self, _: RecordId) -> catalog_db_overlay::Result<Option<CreatedRecord>> {
        down()
    }
    async fn scan_current(&self) -> catalog_db_overlay::Result<Vec<CurrentPayload>> {
        down()
    }
}

/// Memory store whose saves fail for chosen ids.
#[derive(Debug, Default)]
pub struct RejectingOverlay {
    inner: MemoryOverlayStore,
    reject: Mutex<HashSet<RecordId>>,
}

impl RejectingOverlay {
    pub fn rejecting(ids: &[RecordId]) -> Self {
        Self {
            inner: MemoryOverlayStore::new(),
            reject: Mutex::new(ids.iter().copied().collect()),
        }
    }
}

#[async_trait]
impl OverlayStore for RejectingOverlay {
    async fn save(&self, id: RecordId, payload: &[u8], editor: &str) -> catalog_db_overlay::Result<OverlayRecord> {
        if self.reject.lock().contains(&id) {
            return down();
        }
        self.inner.save(id, payload, editor).await
    }
    async fn get_latest(&self, id: RecordId) -> catalog_db_overlay::Result<Option<OverlayRecord>> {
        self.inner.get_latest(id).await
    }
    async fn history(&self, id: RecordId) -> catalog_db_overlay::Result<Vec<OverlayRecord>> {
        self.inner.history(id).await
    }
    async fn create(&self, payload: &[u8], creator: &str) -> catalog_db_overlay::Result<RecordId> {
        self.inner.create(payload, creator).await
    }
    async fn get_created(&self, id: RecordId) -> catalog_db_overlay::Result<Option<CreatedRecord>> {
        self.inner.get_created(id).await
    }
    async fn scan_current(&self) -> catalog_db_overlay::Result<Vec<CurrentPayload>> {
        self.inner.scan_current().await
    }
}
