//! # Catalog DB Core
//!
//! Runtime-agnostic core library for the catalog record engine.
//!
//! This crate provides:
//! - The record model: [`CatalogRecord`], [`Field`], [`Subfields`]
//! - The wire codec ([`codec::decode`] / [`codec::encode`])
//! - Record identifiers ([`RecordId`]) and external identifiers
//! - Descriptive-field helpers shared by ingestion, linking and synthesis
//!
//! ## Design Principles
//!
//! 1. **No I/O**: storage, archives and caches live in sibling crates
//! 2. **Order is data**: field order and repeated subfield codes survive
//!    decode/encode untouched; canonical ordering is an explicit step

pub mod codec;
pub mod descriptive;
pub mod error;
pub mod identifiers;
pub mod ids;
pub mod record;
pub mod subfields;

pub use codec::{decode, encode, read_next};
pub use error::{CodecError, Error, Result};
pub use identifiers::{
    control_number, normalize_oclc, oclc_number, preferred_identifier, Identifier,
    DEFAULT_LOCAL_SOURCE,
};
pub use ids::{RecordId, CREATED_ID_BASE};
pub use record::{CatalogRecord, Field, FieldBody, Indicators, Leader, Tag, DEFAULT_LEADER};
pub use subfields::{Subfield, Subfields, DISPLAY_JOIN};
