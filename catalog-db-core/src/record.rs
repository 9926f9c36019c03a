//! In-memory catalog record model.
//!
//! A [`CatalogRecord`] is a leader plus an ordered list of [`Field`]s. Field
//! order is whatever the record was built or decoded with; the canonical
//! tag-ascending view is produced on demand by [`CatalogRecord::normalized`].

use crate::error::CodecError;
use crate::subfields::Subfields;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a leader in bytes.
pub const LEADER_LEN: usize = 24;

/// Leader used for records built from scratch.
pub const DEFAULT_LEADER: &str = "00000nam a2200000 i 4500";

// ============================================================================
// Tag
// ============================================================================

/// Three-character field tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag([u8; 3]);

impl Tag {
    /// Build a tag from a literal. Callers pass ASCII alphanumerics.
    pub const fn from_static(bytes: &[u8; 3]) -> Tag {
        Tag(*bytes)
    }

    pub fn parse(s: &str) -> Result<Tag, CodecError> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(CodecError::InvalidTag(s.to_string()));
        }
        Ok(Tag([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Control fields are the tags that start with two zeros.
    pub fn is_control(&self) -> bool {
        self.0[0] == b'0' && self.0[1] == b'0'
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.as_str())
    }
}

impl TryFrom<String> for Tag {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Tag::parse(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.as_str().to_string()
    }
}

// ============================================================================
// Indicators
// ============================================================================

/// Indicator pair of a data field; a space means "unset".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicators {
    pub ind1: char,
    pub ind2: char,
}

impl Indicators {
    pub const BLANK: Indicators = Indicators {
        ind1: ' ',
        ind2: ' ',
    };

    pub const fn new(ind1: char, ind2: char) -> Self {
        Self { ind1, ind2 }
    }
}

impl Default for Indicators {
    fn default() -> Self {
        Self::BLANK
    }
}

impl fmt::Display for Indicators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.ind1, self.ind2)
    }
}

// ============================================================================
// Field
// ============================================================================

/// Content of a field: raw control data, or indicators plus subfields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldBody {
    Control(String),
    Data {
        indicators: Indicators,
        subfields: Subfields,
    },
}

/// A tagged field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub tag: Tag,
    pub body: FieldBody,
}

impl Field {
    pub fn control(tag: Tag, data: impl Into<String>) -> Self {
        Self {
            tag,
            body: FieldBody::Control(data.into()),
        }
    }

    /// A data field with no subfields yet.
    pub fn data(tag: Tag, indicators: Indicators) -> Self {
        Self {
            tag,
            body: FieldBody::Data {
                indicators,
                subfields: Subfields::new(),
            },
        }
    }

    pub fn with_subfields(tag: Tag, indicators: Indicators, subfields: Subfields) -> Self {
        Self {
            tag,
            body: FieldBody::Data {
                indicators,
                subfields,
            },
        }
    }

    /// Append a subfield (builder style). No-op on control fields.
    pub fn subfield(mut self, code: char, value: impl Into<String>) -> Self {
        if let Some(sf) = self.subfields_mut() {
            sf.push(code, value);
        }
        self
    }

    pub fn is_control(&self) -> bool {
        matches!(self.body, FieldBody::Control(_))
    }

    pub fn control_data(&self) -> Option<&str> {
        match &self.body {
            FieldBody::Control(data) => Some(data),
            FieldBody::Data { .. } => None,
        }
    }

    pub fn indicators(&self) -> Option<Indicators> {
        match &self.body {
            FieldBody::Data { indicators, .. } => Some(*indicators),
            FieldBody::Control(_) => None,
        }
    }

    pub fn subfields(&self) -> Option<&Subfields> {
        match &self.body {
            FieldBody::Data { subfields, .. } => Some(subfields),
            FieldBody::Control(_) => None,
        }
    }

    pub fn subfields_mut(&mut self) -> Option<&mut Subfields> {
        match &mut self.body {
            FieldBody::Data { subfields, .. } => Some(subfields),
            FieldBody::Control(_) => None,
        }
    }

    /// First value of `code`, or `None` for control fields.
    pub fn first(&self, code: char) -> Option<&str> {
        self.subfields().and_then(|sf| sf.first(code))
    }

    /// All values of `code` in order (empty for control fields).
    pub fn values(&self, code: char) -> Vec<&str> {
        self.subfields()
            .map(|sf| sf.values(code).collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Leader
// ============================================================================

/// The fixed 24-byte leader.
///
/// Length and base address (positions 0-4, 12-16) are recomputed on encode;
/// every other position is carried through unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Leader(String);

impl Leader {
    /// Accept a raw leader, padding or truncating to 24 ASCII bytes.
    pub fn new(raw: &str) -> Self {
        let mut s: String = raw
            .chars()
            .map(|c| if c.is_ascii() { c } else { ' ' })
            .take(LEADER_LEN)
            .collect();
        while s.len() < LEADER_LEN {
            s.push(' ');
        }
        Leader(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn position(&self, pos: usize) -> char {
        self.0.as_bytes().get(pos).map(|b| *b as char).unwrap_or(' ')
    }

    pub fn set_position(&mut self, pos: usize, c: char) {
        if pos >= LEADER_LEN || !c.is_ascii() {
            return;
        }
        let mut bytes = self.0.clone().into_bytes();
        bytes[pos] = c as u8;
        self.0 = String::from_utf8(bytes).unwrap_or_else(|_| DEFAULT_LEADER.to_string());
    }

    pub fn record_status(&self) -> char {
        self.position(5)
    }

    pub fn record_type(&self) -> char {
        self.position(6)
    }

    pub fn bib_level(&self) -> char {
        self.position(7)
    }

    pub fn set_bib_level(&mut self, c: char) {
        self.set_position(7, c);
    }
}

impl From<String> for Leader {
    fn from(raw: String) -> Self {
        Leader::new(&raw)
    }
}

impl From<Leader> for String {
    fn from(leader: Leader) -> Self {
        leader.0
    }
}

impl Default for Leader {
    fn default() -> Self {
        Leader(DEFAULT_LEADER.to_string())
    }
}

// ============================================================================
// CatalogRecord
// ============================================================================

/// A bibliographic record: leader plus ordered fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub leader: Leader,
    pub fields: Vec<Field>,
}

impl CatalogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leader(leader: Leader) -> Self {
        Self {
            leader,
            fields: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Replace the field at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, field: Field) -> Option<Field> {
        let slot = self.fields.get_mut(index)?;
        Some(std::mem::replace(slot, field))
    }

    pub fn remove(&mut self, index: usize) -> Option<Field> {
        if index < self.fields.len() {
            Some(self.fields.remove(index))
        } else {
            None
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&Field) -> bool) {
        self.fields.retain(f);
    }

    /// Fields carrying `tag`, in record order.
    pub fn fields_with_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a Field> + 'a {
        let wanted: Option<[u8; 3]> = tag.as_bytes().try_into().ok();
        self.fields.iter().filter(move |f| Some(f.tag.0) == wanted)
    }

    pub fn first_field(&self, tag: &str) -> Option<&Field> {
        self.fields_with_tag(tag).next()
    }

    /// Data of the first control field with `tag`.
    pub fn control(&self, tag: &str) -> Option<&str> {
        self.fields_with_tag(tag).find_map(Field::control_data)
    }

    /// First `$code` of the first `tag` field that has one.
    pub fn first_value(&self, tag: &str, code: char) -> Option<&str> {
        self.fields_with_tag(tag).find_map(|f| f.first(code))
    }

    /// Canonical copy with fields stably sorted by tag.
    pub fn normalized(&self) -> CatalogRecord {
        let mut out = self.clone();
        out.fields.sort_by(|a, b| a.tag.cmp(&b.tag));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_validation() {
        assert!(Tag::parse("245").is_ok());
        assert!(Tag::parse("LDR").is_ok());
        assert!(Tag::parse("24").is_err());
        assert!(Tag::parse("2 5").is_err());
        assert!(Tag::parse("001").unwrap().is_control());
        assert!(!Tag::parse("010").unwrap().is_control());
    }

    #[test]
    fn normalized_is_stable_by_tag() {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"650"), Indicators::BLANK).subfield('a', "first"));
        rec.push(Field::control(Tag::from_static(b"001"), "x1"));
        rec.push(Field::data(Tag::from_static(b"650"), Indicators::BLANK).subfield('a', "second"));
        let norm = rec.normalized();
        assert_eq!(norm.fields[0].tag.as_str(), "001");
        assert_eq!(norm.fields[1].first('a'), Some("first"));
        assert_eq!(norm.fields[2].first('a'), Some("second"));
        // original order untouched
        assert_eq!(rec.fields[0].tag.as_str(), "650");
    }

    #[test]
    fn lookups_outlive_the_tag_argument() {
        let mut rec = CatalogRecord::new();
        rec.push(Field::control(Tag::from_static(b"001"), "x1"));
        rec.push(Field::data(Tag::from_static(b"245"), Indicators::BLANK).subfield('a', "Atlas"));

        let control = {
            let tag = String::from("001");
            rec.control(&tag)
        };
        let title = {
            let tag = String::from("245");
            rec.first_value(&tag, 'a')
        };
        assert_eq!(control, Some("x1"));
        assert_eq!(title, Some("Atlas"));
        assert!(rec.first_field("24").is_none());
    }

    #[test]
    fn leader_positions() {
        let mut leader = Leader::new("short");
        assert_eq!(leader.as_str().len(), LEADER_LEN);
        leader.set_bib_level('s');
        assert_eq!(leader.bib_level(), 's');
        assert_eq!(Leader::default().record_type(), 'a');
    }

    #[test]
    fn tag_serializes_as_string() {
        let tag = Tag::from_static(b"773");
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"773\"");
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}
