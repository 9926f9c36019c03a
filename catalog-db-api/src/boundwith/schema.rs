//! Link-field encodings.
//!
//! Written today:
//!
//! ```text
//! host   774 08 $i Contains: $g <ordinal> $t <child title> $w <child id>
//! child  773 08 $i Bound with: $t <host title> $w <host id>
//! ```
//!
//! Recognized when stripping, every encoding ever written:
//!
//! | encoding | shape |
//! |---|---|
//! | `Current` | `08` plus the `$i` phrase |
//! | `DisplayConstant` | `0 ` with `$w`, no phrase |
//! | `Phrase` | any indicators, `$i` phrase matching contains / bound with |
//! | `Note` | `501 $a Bound with ...` on a child |
//!
//! 773/774 fields that match none of these (other relationships) are kept.

use catalog_db_core::{CatalogRecord, Field, Identifier, Indicators, Tag};
use regex::Regex;
use std::sync::OnceLock;

pub const HOST_LINK_TAG: Tag = Tag::from_static(b"774");
pub const CHILD_LINK_TAG: Tag = Tag::from_static(b"773");
pub const NOTE_TAG: Tag = Tag::from_static(b"501");

pub const LINK_INDICATORS: Indicators = Indicators::new('0', '8');
const DISPLAY_CONSTANT_INDICATORS: Indicators = Indicators::new('0', ' ');

pub const CONTAINS_PHRASE: &str = "Contains:";
pub const BOUND_WITH_PHRASE: &str = "Bound with:";

fn contains_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*contains\s*:?\s*$").unwrap())
}

fn bound_with_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*bound\s+with\s*:?\s*$").unwrap())
}

fn bound_with_note_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*bound\s+with\b").unwrap())
}

/// How a recognized link field was encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEncoding {
    Current,
    DisplayConstant,
    Phrase,
    Note,
}

fn classify(field: &Field, tag: Tag, phrase: &Regex) -> Option<LinkEncoding> {
    if field.tag != tag {
        return None;
    }
    let indicators = field.indicators()?;
    let phrases = field.values('i');
    let has_phrase = phrases.iter().any(|v| phrase.is_match(v));
    match (has_phrase, indicators) {
        (true, LINK_INDICATORS) => Some(LinkEncoding::Current),
        (true, _) => Some(LinkEncoding::Phrase),
        // Any other `$i` names a different relationship.
        (false, DISPLAY_CONSTANT_INDICATORS) if phrases.is_empty() && field.first('w').is_some() => {
            Some(LinkEncoding::DisplayConstant)
        }
        _ => None,
    }
}

/// Encoding of a host-side "contains" field, if `field` is one.
pub fn host_link_encoding(field: &Field) -> Option<LinkEncoding> {
    classify(field, HOST_LINK_TAG, contains_regex())
}

/// Encoding of a child-side "bound with" field or note, if `field` is one.
pub fn child_link_encoding(field: &Field) -> Option<LinkEncoding> {
    if field.tag == NOTE_TAG {
        return field
            .first('a')
            .filter(|a| bound_with_note_regex().is_match(a))
            .map(|_| LinkEncoding::Note);
    }
    classify(field, CHILD_LINK_TAG, bound_with_regex())
}

/// Remove every host link field. Returns how many were removed.
pub fn strip_host_links(record: &mut CatalogRecord) -> usize {
    let before = record.len();
    record.retain(|f| host_link_encoding(f).is_none());
    before - record.len()
}

/// Remove every child link field and bound-with note.
pub fn strip_child_links(record: &mut CatalogRecord) -> usize {
    let before = record.len();
    record.retain(|f| child_link_encoding(f).is_none());
    before - record.len()
}

pub fn contains_field(ordinal: usize, child_title: &str, child_id: &Identifier) -> Field {
    Field::data(HOST_LINK_TAG, LINK_INDICATORS)
        .subfield('i', CONTAINS_PHRASE)
        .subfield('g', ordinal.to_string())
        .subfield('t', child_title)
        .subfield('w', child_id.to_string())
}

pub fn bound_with_field(host_title: &str, host_id: &Identifier) -> Field {
    Field::data(CHILD_LINK_TAG, LINK_INDICATORS)
        .subfield('i', BOUND_WITH_PHRASE)
        .subfield('t', host_title)
        .subfield('w', host_id.to_string())
}

/// `$w` of every host link field, in record order.
pub fn contained_references(record: &CatalogRecord) -> Vec<String> {
    record
        .fields
        .iter()
        .filter(|f| host_link_encoding(f).is_some())
        .filter_map(|f| f.first('w'))
        .map(|w| w.trim().to_string())
        .collect()
}

/// `$w` of the first child link field.
pub fn host_reference(record: &CatalogRecord) -> Option<String> {
    record
        .fields
        .iter()
        .filter(|f| f.tag == CHILD_LINK_TAG && child_link_encoding(f).is_some())
        .find_map(|f| f.first('w'))
        .map(|w| w.trim().to_string())
}
