//! # Catalog DB API
//!
//! High-level API for the catalog record engine: record resolution over the
//! archive and overlay layers, field editing, boundwith linking and host
//! record synthesis.
//!
//! This crate composes the lower-level crates:
//! - `catalog-db-core` - record model and wire codec
//! - `catalog-db-archive` - archive index, archive reader, parse cache
//! - `catalog-db-overlay` - append-only edit and created-record store
//!
//! ## Quick Start
//!
//! ```ignore
//! use catalog_db_api::{Catalog, CatalogConfig, FieldOrder};
//!
//! let catalog = Catalog::open(CatalogConfig::load("catalog.toml".as_ref())?)?;
//! catalog.rebuild_index().await?;
//!
//! let fields = catalog.get_fields(RecordId(42), true, FieldOrder::Sorted).await?;
//! let outcome = catalog.link(RecordId(7), &[RecordId(8), RecordId(9)], None).await?;
//! ```

pub mod boundwith;
mod catalog;
pub mod config;
pub mod defaults;
mod error;
pub mod fields;
pub mod relationship;
pub mod resolver;
pub mod synth;

pub use boundwith::{
    BoundwithLinker, HoldingsData, LinkOptions, LinkOutcome, MissingChildPolicy, SkippedChild,
};
pub use catalog::{Catalog, Export, RebuildReport};
pub use config::{CatalogConfig, LinkConfig, SynthesisConfig};
pub use error::{ApiError, Result};
pub use fields::{FieldInput, FieldOrder, FieldView, SubfieldInput};
pub use relationship::Relationship;
pub use resolver::{RecordResolver, RecordSource, Resolved};
pub use synth::{
    DateType, FixedFieldAnalysis, HostMetadata, Preview, SynthesisOptions, SynthesisOutcome,
};

// Re-exported so callers need only this crate.
pub use catalog_db_archive::{IndexSummary, IngestReport, SearchQuery};
pub use catalog_db_core::{CatalogRecord, Field, Identifier, RecordId};
pub use catalog_db_overlay::OverlayRecord;
