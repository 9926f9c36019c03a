//! Read-only archive access for the catalog engine.
//!
//! This crate owns the archival side of record resolution:
//!
//! - the ingestion pass that streams every archive once and records where
//!   each record starts ([`ingest`])
//! - the [`ArchiveIndex`] trait with in-memory and SQLite backends
//! - the [`ArchiveReader`] that fetches one record by byte offset
//! - the [`RecordCache`] of parsed archival records
//!
//! ```text
//! records_dir/
//!   vol1.zip ── records.mrc   [rec 1][rec 2][rec 3]...
//!   vol2.zip ── records.mrc   [rec N][rec N+1]...
//!                              ^ byte_offset, byte_length per id
//! ```

pub mod cache;
pub mod error;
pub mod index;
pub mod ingest;
pub mod location;
pub mod reader;
pub mod sqlite;

// ── Key types ────────────────────────────────────────────────────────────────
pub use cache::{CacheStats, RecordCache, DEFAULT_CACHE_CAPACITY};
pub use error::{ArchiveError, Result};
pub use index::{ArchiveIndex, MemoryArchiveIndex};
pub use ingest::{ingest_dir, IngestReport};
pub use location::{ArchiveLocation, IndexEntry, IndexSummary, SearchQuery, SecondaryKeys};
pub use reader::ArchiveReader;
pub use sqlite::SqliteArchiveIndex;
