//! Field-level views and edits.
//!
//! Views carry each field's position in the stored record, so a caller can
//! display fields tag-sorted and still address them by index for edits.
//! Repeated subfield codes are joined with `" ; "` in views only; edits
//! always operate on the full ordered subfield list.

use crate::error::{ApiError, Result};
use crate::resolver::RecordResolver;
use catalog_db_core::codec::{FIELD_TERMINATOR, RECORD_TERMINATOR, SUBFIELD_DELIMITER};
use catalog_db_core::{CatalogRecord, Field, FieldBody, Indicators, RecordId, Subfields, Tag};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Display order for [`get_fields`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    /// Stored order
    #[default]
    Original,
    /// Stable tag-ascending order
    Sorted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplaySubfield {
    pub code: char,
    pub value: String,
}

/// One field as presented to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldView {
    /// Position in the stored record
    pub index: usize,
    pub tag: String,
    pub ind1: char,
    pub ind2: char,
    /// Raw data of a control field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Subfields of a data field, repeats joined for display
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subfields: Vec<DisplaySubfield>,
}

impl FieldView {
    pub fn from_field(index: usize, field: &Field) -> Self {
        match &field.body {
            FieldBody::Control(data) => Self {
                index,
                tag: field.tag.to_string(),
                ind1: ' ',
                ind2: ' ',
                value: Some(data.clone()),
                subfields: Vec::new(),
            },
            FieldBody::Data {
                indicators,
                subfields,
            } => Self {
                index,
                tag: field.tag.to_string(),
                ind1: indicators.ind1,
                ind2: indicators.ind2,
                value: None,
                subfields: subfields
                    .display_map()
                    .into_iter()
                    .map(|(code, value)| DisplaySubfield { code, value })
                    .collect(),
            },
        }
    }
}

/// One-line rendering, e.g. `245 10 $a Title $c Author`.
pub fn render_field(field: &Field) -> String {
    match &field.body {
        FieldBody::Control(data) => format!("{} {data}", field.tag),
        FieldBody::Data {
            indicators,
            subfields,
        } => {
            let mut line = format!("{} {indicators}", field.tag);
            for sf in subfields {
                line.push_str(&format!(" ${} {}", sf.code, sf.value));
            }
            line
        }
    }
}

/// Views of every field in `record`.
pub fn field_views(record: &CatalogRecord, order: FieldOrder) -> Vec<FieldView> {
    let mut views: Vec<FieldView> = record
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| FieldView::from_field(i, f))
        .collect();
    if order == FieldOrder::Sorted {
        views.sort_by(|a, b| a.tag.cmp(&b.tag));
    }
    views
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubfieldInput {
    pub code: char,
    pub value: String,
}

/// Caller-supplied field content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInput {
    pub tag: String,
    #[serde(default)]
    pub ind1: Option<char>,
    #[serde(default)]
    pub ind2: Option<char>,
    /// Control-field data
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub subfields: Vec<SubfieldInput>,
}

impl FieldInput {
    pub fn control(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn data(tag: impl Into<String>, ind1: char, ind2: char) -> Self {
        Self {
            tag: tag.into(),
            ind1: Some(ind1),
            ind2: Some(ind2),
            ..Self::default()
        }
    }

    pub fn subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.subfields.push(SubfieldInput {
            code,
            value: value.into(),
        });
        self
    }

    /// Validate and convert to a stored field.
    pub fn to_field(&self) -> Result<Field> {
        let tag = Tag::parse(self.tag.trim()).map_err(|e| ApiError::invalid_field(e.to_string()))?;
        if tag.is_control() {
            if !self.subfields.is_empty() {
                return Err(ApiError::invalid_field(format!(
                    "control field {tag} cannot carry subfields"
                )));
            }
            let value = self.value.clone().unwrap_or_default();
            check_text(&tag, &value)?;
            return Ok(Field::control(tag, value));
        }

        if self.value.is_some() {
            return Err(ApiError::invalid_field(format!(
                "data field {tag} takes subfields, not a raw value"
            )));
        }
        let ind1 = check_indicator(&tag, self.ind1.unwrap_or(' '))?;
        let ind2 = check_indicator(&tag, self.ind2.unwrap_or(' '))?;
        let mut subfields = Subfields::new();
        for sf in &self.subfields {
            if !sf.code.is_ascii_alphanumeric() {
                return Err(ApiError::invalid_field(format!(
                    "field {tag}: subfield code {:?} must be an ASCII letter or digit",
                    sf.code
                )));
            }
            check_text(&tag, &sf.value)?;
            subfields.push(sf.code, sf.value.clone());
        }
        Ok(Field::with_subfields(tag, Indicators::new(ind1, ind2), subfields))
    }
}

fn check_indicator(tag: &Tag, c: char) -> Result<char> {
    if c == ' ' || c.is_ascii_alphanumeric() {
        Ok(c)
    } else {
        Err(ApiError::invalid_field(format!(
            "field {tag}: indicator {c:?} must be blank or an ASCII letter or digit"
        )))
    }
}

fn check_text(tag: &Tag, value: &str) -> Result<()> {
    let reserved = [SUBFIELD_DELIMITER, FIELD_TERMINATOR, RECORD_TERMINATOR];
    if value.bytes().any(|b| reserved.contains(&b)) {
        return Err(ApiError::invalid_field(format!(
            "field {tag} contains a reserved delimiter byte"
        )));
    }
    Ok(())
}

fn check_index(record: &CatalogRecord, index: usize) -> Result<()> {
    if index < record.len() {
        Ok(())
    } else {
        Err(ApiError::FieldIndexOutOfRange {
            index,
            len: record.len(),
        })
    }
}

/// Position at which a new field with `tag` keeps tag order: after the last
/// field whose tag sorts at or before it.
pub fn ordered_position(record: &CatalogRecord, tag: &Tag) -> usize {
    record
        .fields
        .iter()
        .rposition(|f| f.tag <= *tag)
        .map(|i| i + 1)
        .unwrap_or(0)
}

// ============================================================================
// Operations
// ============================================================================

pub async fn get_fields(
    resolver: &RecordResolver,
    id: RecordId,
    include_edits: bool,
    order: FieldOrder,
) -> Result<Vec<FieldView>> {
    let record = resolver.resolve(id, include_edits).await?;
    Ok(field_views(&record, order))
}

/// Replace the field at `index` and persist the result as a new version.
pub async fn update_field(
    resolver: &RecordResolver,
    id: RecordId,
    index: usize,
    input: &FieldInput,
    editor: &str,
) -> Result<CatalogRecord> {
    let field = input.to_field()?;
    let mut record = resolver.resolve(id, true).await?;
    check_index(&record, index)?;
    record.replace(index, field);
    resolver.save(id, &record, editor).await?;
    info!(record_id = %id, index, tag = %input.tag, "field updated");
    Ok(record)
}

/// Insert a field in tag order and persist. Returns the record and the new
/// field's index.
pub async fn add_field(
    resolver: &RecordResolver,
    id: RecordId,
    input: &FieldInput,
    editor: &str,
) -> Result<(CatalogRecord, usize)> {
    let field = input.to_field()?;
    let mut record = resolver.resolve(id, true).await?;
    let at = ordered_position(&record, &field.tag);
    record.fields.insert(at, field);
    resolver.save(id, &record, editor).await?;
    info!(record_id = %id, index = at, tag = %input.tag, "field added");
    Ok((record, at))
}

/// Remove the field at `index` and persist.
pub async fn delete_field(
    resolver: &RecordResolver,
    id: RecordId,
    index: usize,
    editor: &str,
) -> Result<CatalogRecord> {
    let mut record = resolver.resolve(id, true).await?;
    check_index(&record, index)?;
    let removed = record.remove(index);
    resolver.save(id, &record, editor).await?;
    info!(
        record_id = %id,
        index,
        tag = removed.as_ref().map(|f| f.tag.as_str()).unwrap_or(""),
        "field deleted"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogRecord {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"650"), Indicators::new(' ', '0')).subfield('a', "Mines"));
        rec.push(Field::control(Tag::from_static(b"001"), "x1"));
        rec.push(
            Field::data(Tag::from_static(b"245"), Indicators::new('1', '0'))
                .subfield('a', "Report")
                .subfield('a', "Supplement"),
        );
        rec
    }

    #[test]
    fn views_keep_stored_index_when_sorted() {
        let views = field_views(&sample(), FieldOrder::Sorted);
        let tags: Vec<_> = views.iter().map(|v| (v.tag.as_str(), v.index)).collect();
        assert_eq!(tags, vec![("001", 1), ("245", 2), ("650", 0)]);
        assert_eq!(views[1].subfields[0].value, "Report ; Supplement");
        assert_eq!(views[0].value.as_deref(), Some("x1"));
    }

    #[test]
    fn input_validation() {
        assert!(FieldInput::control("008", "abc").to_field().unwrap().is_control());
        assert!(FieldInput::data("24", '1', '0').to_field().is_err());
        assert!(FieldInput::data("245", '#', '0').to_field().is_err());
        assert!(FieldInput::control("001", "x").subfield('a', "y").to_field().is_err());
        assert!(FieldInput::data("245", '1', '0')
            .subfield('a', "bad\u{1f}value")
            .to_field()
            .is_err());
        let mut input = FieldInput::data("500", ' ', ' ');
        input.value = Some("raw".into());
        assert!(input.to_field().is_err());

        let field = FieldInput::data("500", ' ', ' ')
            .subfield('a', "one")
            .subfield('a', "two")
            .to_field()
            .unwrap();
        assert_eq!(field.values('a'), vec!["one", "two"]);
    }

    #[test]
    fn ordered_insert_position() {
        let mut rec = CatalogRecord::new();
        for tag in [b"001", b"245", b"650"] {
            rec.push(Field::data(Tag::from_static(tag), Indicators::BLANK));
        }
        assert_eq!(ordered_position(&rec, &Tag::from_static(b"500")), 2);
        assert_eq!(ordered_position(&rec, &Tag::from_static(b"650")), 3);
        assert_eq!(ordered_position(&rec, &Tag::from_static(b"000")), 0);
    }

    #[test]
    fn field_input_from_json() {
        let input: FieldInput = serde_json::from_str(
            r#"{"tag": "650", "ind1": " ", "ind2": "0",
                "subfields": [{"code": "a", "value": "Mines"}, {"code": "x", "value": "Statistics"}]}"#,
        )
        .unwrap();
        let field = input.to_field().unwrap();
        assert_eq!(render_field(&field), "650  0 $a Mines $x Statistics");

        let control: FieldInput = serde_json::from_str(r#"{"tag": "001", "value": "abc"}"#).unwrap();
        assert_eq!(render_field(&control.to_field().unwrap()), "001 abc");
    }
}
