//! Host record synthesis.
//!
//! A synthesized host is a created record: it has no archive entry and gets
//! an id from the created range. Its descriptive fields come from the caller;
//! its 008 comes from [`FixedFieldAnalysis`] over the children. After
//! creation the host is linked to the same children.

pub mod fixed_field;
pub mod preview;

pub use fixed_field::{DateType, FixedFieldAnalysis};
pub use preview::{build_preview, Preview};

use crate::boundwith::{BoundwithLinker, HoldingsData, LinkOptions, LinkOutcome};
use crate::defaults::{DEFAULT_CATALOGING_AGENCY, DEFAULT_LANGUAGE};
use crate::error::{ApiError, Result};
use crate::resolver::RecordResolver;
use catalog_db_core::{
    descriptive, CatalogRecord, Field, Indicators, Leader, RecordId, Tag, DEFAULT_LEADER,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Caller-supplied descriptive metadata for a new host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostMetadata {
    pub place: Option<String>,
    pub publisher: Option<String>,
    pub series: Option<String>,
    pub subjects: Vec<String>,
    /// 500 note; a count of bound items is used when absent
    pub note: Option<String>,
    /// 300 `$a`; a count of bound items is used when absent
    pub extent: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub default_language: String,
    pub cataloging_agency: String,
    /// 008/00-05; today when unset
    pub date_entered: Option<NaiveDate>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            cataloging_agency: DEFAULT_CATALOGING_AGENCY.to_string(),
            date_entered: None,
        }
    }
}

impl SynthesisOptions {
    fn entered(&self) -> NaiveDate {
        self.date_entered.unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn tag(t: &[u8; 3]) -> Tag {
    Tag::from_static(t)
}

fn nonblank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Build a host record for `children`. Pure; nothing is persisted.
pub fn synthesize(
    title: &str,
    meta: &HostMetadata,
    children: &[CatalogRecord],
    options: &SynthesisOptions,
) -> Result<CatalogRecord> {
    let title = descriptive::normalize_text(title);
    if title.is_empty() {
        return Err(ApiError::bad_request("a synthesized host needs a title"));
    }
    let analysis = FixedFieldAnalysis::from_children(children, &options.default_language);

    let mut leader = Leader::new(DEFAULT_LEADER);
    if analysis.is_continuing() {
        leader.set_bib_level('s');
    }
    let mut record = CatalogRecord::with_leader(leader);

    record.push(Field::control(tag(b"008"), analysis.render(options.entered())));

    let agency = options.cataloging_agency.as_str();
    record.push(
        Field::data(tag(b"040"), Indicators::BLANK)
            .subfield('a', agency)
            .subfield('b', "eng")
            .subfield('e', "rda")
            .subfield('c', agency),
    );

    record.push(Field::data(tag(b"245"), Indicators::new('1', '0')).subfield('a', title));

    let year_range = analysis.year_range();
    if nonblank(&meta.place).is_some() || nonblank(&meta.publisher).is_some() || year_range.is_some() {
        let mut imprint = Field::data(tag(b"264"), Indicators::new(' ', '1'));
        if let Some(place) = nonblank(&meta.place) {
            imprint = imprint.subfield('a', place);
        }
        if let Some(publisher) = nonblank(&meta.publisher) {
            imprint = imprint.subfield('b', publisher);
        }
        if let Some(years) = year_range {
            imprint = imprint.subfield('c', years);
        }
        record.push(imprint);
    }

    let count = children.len();
    let extent = nonblank(&meta.extent)
        .map(str::to_string)
        .unwrap_or_else(|| format!("1 volume ({count} items bound together)"));
    record.push(Field::data(tag(b"300"), Indicators::BLANK).subfield('a', extent));

    record.push(
        Field::data(tag(b"336"), Indicators::BLANK)
            .subfield('a', "text")
            .subfield('b', "txt")
            .subfield('2', "rdacontent"),
    );
    record.push(
        Field::data(tag(b"337"), Indicators::BLANK)
            .subfield('a', "unmediated")
            .subfield('b', "n")
            .subfield('2', "rdamedia"),
    );
    record.push(
        Field::data(tag(b"338"), Indicators::BLANK)
            .subfield('a', "volume")
            .subfield('b', "nc")
            .subfield('2', "rdacarrier"),
    );

    if let Some(series) = nonblank(&meta.series) {
        record.push(Field::data(tag(b"490"), Indicators::new('0', ' ')).subfield('a', series));
    }

    let note = nonblank(&meta.note)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Bound volume of {count} items."));
    record.push(Field::data(tag(b"500"), Indicators::BLANK).subfield('a', note));

    for subject in meta.subjects.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        record.push(Field::data(tag(b"650"), Indicators::new(' ', '0')).subfield('a', subject));
    }

    Ok(record)
}

/// Result of [`synthesize_host`].
#[derive(Clone, Debug, Serialize)]
pub struct SynthesisOutcome {
    pub host_id: RecordId,
    pub record: CatalogRecord,
    pub link: LinkOutcome,
}

/// Synthesize, persist as a created record, then link it to `child_ids`.
pub async fn synthesize_host(
    resolver: &RecordResolver,
    title: &str,
    meta: &HostMetadata,
    child_ids: &[RecordId],
    holdings: Option<&HoldingsData>,
    options: &SynthesisOptions,
    link_options: &LinkOptions,
) -> Result<SynthesisOutcome> {
    if child_ids.is_empty() {
        return Err(ApiError::bad_request("a synthesized host needs at least one child"));
    }
    let linker = BoundwithLinker::new(resolver, link_options.clone());
    let (children, mut skipped) = linker.resolve_children(child_ids).await?;
    let records: Vec<CatalogRecord> = children.iter().map(|(_, r)| r.clone()).collect();
    let host = synthesize(title, meta, &records, options)?;

    let host_id = resolver.create(&host, &link_options.editor).await?;
    info!(host_id = %host_id, children = records.len(), "host record created");

    let resolved_ids: Vec<RecordId> = children.iter().map(|(id, _)| *id).collect();
    let mut link = linker.link(host_id, &resolved_ids, holdings).await?;
    // Children missing before synthesis never reach the linker.
    skipped.append(&mut link.skipped);
    link.skipped = skipped;
    let record = resolver.resolve(host_id, true).await?;
    Ok(SynthesisOutcome {
        host_id,
        record,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(title: &str, year: &str) -> CatalogRecord {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(tag(b"086"), Indicators::new('0', ' ')).subfield('a', "I 1.1:990"));
        rec.push(Field::data(tag(b"245"), Indicators::new('1', '0')).subfield('a', title));
        rec.push(Field::data(tag(b"264"), Indicators::new(' ', '1')).subfield('c', year));
        rec
    }

    fn options() -> SynthesisOptions {
        SynthesisOptions {
            date_entered: NaiveDate::from_ymd_opt(2024, 1, 2),
            ..SynthesisOptions::default()
        }
    }

    #[test]
    fn field_order_and_leader() {
        let meta = HostMetadata {
            publisher: Some("G.P.O.".into()),
            series: Some("House document".into()),
            subjects: vec!["Mines and mineral resources".into()],
            ..HostMetadata::default()
        };
        let children = [child("Annual report 1990", "1990"), child("Annual report 1991", "1991")];
        let rec = synthesize("Annual reports", &meta, &children, &options()).unwrap();
        let tags: Vec<&str> = rec.fields.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["008", "040", "245", "264", "300", "336", "337", "338", "490", "500", "650"]
        );
        assert_eq!(rec.leader.bib_level(), 's');
        assert_eq!(rec.first_value("264", 'c'), Some("1990-1991"));
        assert_eq!(rec.first_value("300", 'a'), Some("1 volume (2 items bound together)"));
        let fixed = rec.control("008").unwrap();
        assert_eq!(fixed.len(), 40);
        assert_eq!(&fixed[0..6], "240102");
    }

    #[test]
    fn minimal_host_is_monograph() {
        let rec = synthesize("Pamphlets", &HostMetadata::default(), &[child("Atlas", "1990")], &options()).unwrap();
        assert_eq!(rec.leader.bib_level(), 'm');
        assert!(rec.first_field("490").is_none());
        assert!(rec.first_field("650").is_none());
        assert_eq!(rec.first_value("264", 'c'), Some("1990"));
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(synthesize("  ", &HostMetadata::default(), &[], &options()).is_err());
    }
}
