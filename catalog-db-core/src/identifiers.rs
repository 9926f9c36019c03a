//! External and preferred record identifiers.
//!
//! A record can be referred to three ways, in descending preference:
//!
//! 1. its OCLC number, `(OCoLC)<digits>`, from 035 `$a`
//! 2. its own control number, `(<org>)<001>`, where `<org>` is 003 or the
//!    local source code
//! 3. a local fallback built from the catalog's id, `(<local>)local-<id>`
//!
//! [`Identifier::parse`] accepts any of these forms back.

use crate::ids::RecordId;
use crate::record::CatalogRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source code used for control-number and local-fallback identifiers.
pub const DEFAULT_LOCAL_SOURCE: &str = "CatDB";

const OCLC_PREFIX: &str = "(OCoLC)";
const LOCAL_MARKER: &str = "local-";

/// Strip the `(OCoLC)` prefix and `ocm`/`ocn`/`on` markers.
pub fn normalize_oclc(raw: &str) -> Option<String> {
    let s = raw.trim();
    let s = s.strip_prefix(OCLC_PREFIX).unwrap_or(s).trim();
    let s = ["ocm", "ocn", "on"]
        .into_iter()
        .find_map(|p| s.strip_prefix(p))
        .unwrap_or(s)
        .trim();
    let digits = s.trim_start_matches('0');
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if digits.is_empty() { "0" } else { digits }.to_string())
}

/// OCLC number from the first 035 `$a` carrying the `(OCoLC)` prefix.
pub fn oclc_number(record: &CatalogRecord) -> Option<String> {
    record
        .fields_with_tag("035")
        .flat_map(|f| f.values('a'))
        .filter(|v| v.contains(OCLC_PREFIX))
        .find_map(normalize_oclc)
}

/// The record's 001, trimmed.
pub fn control_number(record: &CatalogRecord) -> Option<String> {
    record
        .control("001")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A parsed identifier in one of the three supported forms.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identifier {
    Oclc { number: String },
    ControlNumber { source: String, number: String },
    Local { source: String, id: RecordId },
}

impl Identifier {
    /// Parse the rendered form of any identifier. A bare number is taken as
    /// an OCLC number.
    pub fn parse(raw: &str) -> Option<Identifier> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.starts_with(OCLC_PREFIX) {
            return normalize_oclc(s).map(|number| Identifier::Oclc { number });
        }
        if let Some(rest) = s.strip_prefix('(') {
            let (source, number) = rest.split_once(')')?;
            let number = number.trim();
            if source.is_empty() || number.is_empty() {
                return None;
            }
            if let Some(id) = number.strip_prefix(LOCAL_MARKER) {
                let id = id.parse::<RecordId>().ok()?;
                return Some(Identifier::Local {
                    source: source.to_string(),
                    id,
                });
            }
            return Some(Identifier::ControlNumber {
                source: source.to_string(),
                number: number.to_string(),
            });
        }
        normalize_oclc(s).map(|number| Identifier::Oclc { number })
    }

    /// True when `record` carries this identifier.
    ///
    /// Local identifiers never match by content; they are resolved by id.
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        match self {
            Identifier::Oclc { number } => oclc_number(record).as_deref() == Some(number),
            Identifier::ControlNumber { number, .. } => {
                control_number(record).as_deref() == Some(number)
            }
            Identifier::Local { .. } => false,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Oclc { number } => write!(f, "{OCLC_PREFIX}{number}"),
            Identifier::ControlNumber { source, number } => write!(f, "({source}){number}"),
            Identifier::Local { source, id } => write!(f, "({source}){LOCAL_MARKER}{id}"),
        }
    }
}

/// Preferred identifier for `record` stored under `id`.
pub fn preferred_identifier(record: &CatalogRecord, id: RecordId, local_source: &str) -> Identifier {
    if let Some(number) = oclc_number(record) {
        return Identifier::Oclc { number };
    }
    if let Some(number) = control_number(record) {
        let source = record
            .control("003")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(local_source)
            .to_string();
        return Identifier::ControlNumber { source, number };
    }
    Identifier::Local {
        source: local_source.to_string(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Indicators, Tag};

    fn with_035(value: &str) -> CatalogRecord {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"035"), Indicators::BLANK).subfield('a', "(DLC)  90012345"));
        rec.push(Field::data(Tag::from_static(b"035"), Indicators::BLANK).subfield('a', value));
        rec
    }

    #[test]
    fn oclc_normalization() {
        assert_eq!(normalize_oclc("(OCoLC)ocm00012345").as_deref(), Some("12345"));
        assert_eq!(normalize_oclc("(OCoLC)ocn987654321").as_deref(), Some("987654321"));
        assert_eq!(normalize_oclc("(OCoLC)on1234567890").as_deref(), Some("1234567890"));
        assert_eq!(normalize_oclc(" 42 ").as_deref(), Some("42"));
        assert_eq!(normalize_oclc("(OCoLC)abc"), None);
        assert_eq!(oclc_number(&with_035("(OCoLC)ocm00077")).as_deref(), Some("77"));
    }

    #[test]
    fn preferred_identifier_fallback_chain() {
        let rec = with_035("(OCoLC)555");
        assert_eq!(
            preferred_identifier(&rec, RecordId(9), DEFAULT_LOCAL_SOURCE).to_string(),
            "(OCoLC)555"
        );

        let mut ctl = CatalogRecord::new();
        ctl.push(Field::control(Tag::from_static(b"001"), "gpo12"));
        assert_eq!(
            preferred_identifier(&ctl, RecordId(9), DEFAULT_LOCAL_SOURCE).to_string(),
            "(CatDB)gpo12"
        );
        ctl.push(Field::control(Tag::from_static(b"003"), "DGPO"));
        assert_eq!(
            preferred_identifier(&ctl, RecordId(9), DEFAULT_LOCAL_SOURCE).to_string(),
            "(DGPO)gpo12"
        );

        let bare = CatalogRecord::new();
        let local = preferred_identifier(&bare, RecordId(1_000_000_000_007), DEFAULT_LOCAL_SOURCE);
        assert_eq!(local.to_string(), "(CatDB)local-1000000000007");
        assert_eq!(Identifier::parse(&local.to_string()), Some(local));
    }

    #[test]
    fn parse_forms() {
        assert_eq!(
            Identifier::parse("(OCoLC)ocm0099"),
            Some(Identifier::Oclc { number: "99".into() })
        );
        assert_eq!(
            Identifier::parse("(DGPO)gpo12"),
            Some(Identifier::ControlNumber {
                source: "DGPO".into(),
                number: "gpo12".into()
            })
        );
        assert_eq!(Identifier::parse("12345"), Some(Identifier::Oclc { number: "12345".into() }));
        assert_eq!(Identifier::parse("(x)local-abc"), None);
        assert_eq!(Identifier::parse(""), None);
    }
}
