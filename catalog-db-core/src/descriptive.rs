//! Descriptive-field helpers shared by ingestion, linking and synthesis.
//!
//! Everything here is a pure function of a [`CatalogRecord`]: title
//! normalization, publication-year inference, enumeration parsing, and the
//! secondary keys recorded at index-build time.

use crate::record::CatalogRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Title used when a record has no usable 245.
pub const UNTITLED: &str = "[untitled]";

const TRAILING_PUNCTUATION: &[char] = &['/', ':', ';', ',', '.', '=', ' '];

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})\b").unwrap())
}

fn enumeration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:v|vol|volume|no|number|pt|part|issue|bd)\.?\s*(\d+)").unwrap()
    })
}

/// Collapse runs of whitespace and trim trailing ISBD punctuation.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(TRAILING_PUNCTUATION).to_string()
}

/// Normalized title from 245 `$a $b $n $p`, or [`UNTITLED`].
pub fn normalized_title(record: &CatalogRecord) -> String {
    let Some(field) = record.first_field("245") else {
        return UNTITLED.to_string();
    };
    let parts: Vec<&str> = field
        .subfields()
        .map(|sf| {
            sf.iter()
                .filter(|s| matches!(s.code, 'a' | 'b' | 'n' | 'p'))
                .map(|s| s.value.as_str())
                .collect()
        })
        .unwrap_or_default();
    let title = normalize_text(&parts.join(" "));
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Index title: 245 `$a $b $c` joined by a space, trimmed.
pub fn index_title(record: &CatalogRecord) -> Option<String> {
    let field = record.first_field("245")?;
    let parts: Vec<&str> = ['a', 'b', 'c']
        .into_iter()
        .filter_map(|code| field.first(code))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" ").trim().to_string())
    }
}

/// First plausible four-digit year in free text.
pub fn year_in_text(text: &str) -> Option<i32> {
    year_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Date1 from 008/07-10 when it is four digits.
pub fn fixed_field_year(record: &CatalogRecord) -> Option<i32> {
    let data = record.control("008")?;
    let date1 = data.get(7..11)?;
    if date1.len() == 4 && date1.bytes().all(|b| b.is_ascii_digit()) {
        date1.parse().ok()
    } else {
        None
    }
}

/// Publication year: 008 Date1, then 264/260 `$c`, then the title.
pub fn publication_year(record: &CatalogRecord) -> Option<i32> {
    if let Some(year) = fixed_field_year(record) {
        return Some(year);
    }
    for tag in ["264", "260"] {
        for field in record.fields_with_tag(tag) {
            if let Some(year) = field.values('c').into_iter().find_map(year_in_text) {
                return Some(year);
            }
        }
    }
    year_in_text(&normalized_title(record))
}

/// Enumeration number (volume / number / part) parsed from a title.
pub fn enumeration(title: &str) -> Option<u32> {
    enumeration_regex()
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Publication place text from 264/260 `$a`.
pub fn publication_place(record: &CatalogRecord) -> Option<String> {
    ["264", "260"]
        .into_iter()
        .find_map(|tag| record.first_value(tag, 'a'))
        .map(normalize_text)
}

/// Publisher name from 264/260 `$b`.
pub fn publisher(record: &CatalogRecord) -> Option<String> {
    ["264", "260"]
        .into_iter()
        .find_map(|tag| record.first_value(tag, 'b'))
        .map(normalize_text)
        .filter(|s| !s.is_empty())
}

/// Topical subjects (650 `$a`), normalized.
pub fn subjects(record: &CatalogRecord) -> Vec<String> {
    record
        .fields_with_tag("650")
        .flat_map(|f| f.values('a'))
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Language code from 008/35-37, falling back to 041 `$a`.
pub fn language(record: &CatalogRecord) -> Option<String> {
    let from_fixed = record
        .control("008")
        .and_then(|d| d.get(35..38))
        .map(str::trim)
        .filter(|s| s.len() == 3 && s.chars().all(|c| c.is_ascii_lowercase()))
        .map(str::to_string);
    from_fixed.or_else(|| {
        record
            .first_value("041", 'a')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| s.len() == 3)
    })
}

/// SuDoc classification: first 086 with ind1 `0`, subfield `a`.
pub fn sudoc(record: &CatalogRecord) -> Option<String> {
    record
        .fields_with_tag("086")
        .filter(|f| f.indicators().map(|i| i.ind1) == Some('0'))
        .find_map(|f| f.first('a'))
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Indicators, Tag};

    fn record_with_title(a: &str, b: Option<&str>) -> CatalogRecord {
        let mut f = Field::data(Tag::from_static(b"245"), Indicators::new('1', '0')).subfield('a', a);
        if let Some(b) = b {
            f = f.subfield('b', b);
        }
        f = f.subfield('c', "by someone.");
        let mut rec = CatalogRecord::new();
        rec.push(f);
        rec
    }

    #[test]
    fn title_normalization() {
        let rec = record_with_title("Annual   report :", Some("fiscal year 1990 /"));
        assert_eq!(normalized_title(&rec), "Annual report : fiscal year 1990");
        assert_eq!(normalized_title(&CatalogRecord::new()), UNTITLED);
        assert_eq!(
            index_title(&rec).as_deref(),
            Some("Annual   report : fiscal year 1990 / by someone.")
        );
    }

    #[test]
    fn year_fallback_chain() {
        let mut rec = record_with_title("Report for 1987", None);
        assert_eq!(publication_year(&rec), Some(1987));

        rec.push(
            Field::data(Tag::from_static(b"264"), Indicators::new(' ', '1'))
                .subfield('a', "Washington, D.C. :")
                .subfield('c', "[1989]"),
        );
        assert_eq!(publication_year(&rec), Some(1989));

        rec.push(Field::control(
            Tag::from_static(b"008"),
            "900101s1990    dcu           f000 0 eng d",
        ));
        assert_eq!(publication_year(&rec), Some(1990));
        assert_eq!(language(&rec).as_deref(), Some("eng"));
        assert_eq!(publication_place(&rec).as_deref(), Some("Washington, D.C"));
    }

    #[test]
    fn unknown_fixed_date_is_skipped() {
        let mut rec = CatalogRecord::new();
        rec.push(Field::control(
            Tag::from_static(b"008"),
            "900101nuuuuuuuuxx            000 0 eng d",
        ));
        assert_eq!(fixed_field_year(&rec), None);
    }

    #[test]
    fn enumeration_patterns() {
        assert_eq!(enumeration("Statistical abstract, vol. 3"), Some(3));
        assert_eq!(enumeration("Bulletin no.12"), Some(12));
        assert_eq!(enumeration("Hearings, Part 2"), Some(2));
        assert_eq!(enumeration("Volume 10 of the set"), Some(10));
        assert_eq!(enumeration("Annual report"), None);
    }

    #[test]
    fn sudoc_needs_first_indicator_zero() {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"086"), Indicators::new('2', ' ')).subfield('a', "CA1"));
        rec.push(Field::data(Tag::from_static(b"086"), Indicators::new('0', ' ')).subfield('a', "I 28.37:990"));
        assert_eq!(sudoc(&rec).as_deref(), Some("I 28.37:990"));
    }
}
