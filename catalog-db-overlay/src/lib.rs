//! Overlay store for the catalog engine
//!
//! Archives are read-only. Every edit, and every record minted inside the
//! catalog, is written here instead and shadows the archival original.
//!
//! # Design
//!
//! - **Append-only**: each save is a new row; "current" is the last row for an id
//! - **Disjoint ids**: created records are numbered from
//!   [`CREATED_ID_BASE`](catalog_db_core::CREATED_ID_BASE) upward, above
//!   every archive id
//! - **Last write wins**: concurrent writers to one id are not coordinated
//!
//! # Example
//!
//! ```ignore
//! use catalog_db_overlay::{MemoryOverlayStore, OverlayStore};
//!
//! let store = MemoryOverlayStore::new();
//! store.save(id, &bytes, "cataloger").await?;
//! let current = store.get_latest(id).await?;
//! ```

mod error;
mod record;
mod sqlite;
mod store;

pub use error::{OverlayError, Result};
pub use record::{CreatedRecord, CurrentPayload, OverlayRecord};
pub use sqlite::SqliteOverlayStore;
pub use store::{MemoryOverlayStore, OverlayStore};
