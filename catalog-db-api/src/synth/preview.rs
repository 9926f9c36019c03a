//! Dry-run view of a synthesis: what the host would say, and the link lines
//! it would carry, without writing anything.

use super::fixed_field::FixedFieldAnalysis;
use super::SynthesisOptions;
use crate::boundwith::ordering::OrderKey;
use crate::boundwith::{schema, BoundwithLinker, LinkOptions, SkippedChild};
use crate::error::Result;
use crate::fields::render_field;
use crate::resolver::RecordResolver;
use catalog_db_core::{descriptive, preferred_identifier, CatalogRecord, RecordId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub host_title: String,
    pub publisher: Option<String>,
    pub year_range: Option<String>,
    pub subjects: Vec<String>,
    /// Rendered "contains" fields in ordinal order
    pub link_lines: Vec<String>,
    /// The 008 the host would receive
    pub fixed_field: String,
    pub skipped: Vec<SkippedChild>,
}

/// Longest shared leading run of words (case-insensitive), else the first
/// title.
pub fn common_title(titles: &[String]) -> String {
    let Some(first) = titles.first() else {
        return descriptive::UNTITLED.to_string();
    };
    let first_words: Vec<&str> = first.split_whitespace().collect();
    let mut shared = first_words.len();
    for title in &titles[1..] {
        let n = first_words
            .iter()
            .zip(title.split_whitespace())
            .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
            .count();
        shared = shared.min(n);
    }
    let prefix = descriptive::normalize_text(&first_words[..shared].join(" "));
    if prefix.is_empty() {
        first.clone()
    } else {
        prefix
    }
}

/// Most common publisher; ties go to the one seen first.
fn common_publisher(children: &[CatalogRecord]) -> Option<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (i, p) in children.iter().filter_map(descriptive::publisher).enumerate() {
        counts.entry(p).or_insert((0, i)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(p, _)| p)
}

fn union_subjects(children: &[CatalogRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for subject in children.iter().flat_map(descriptive::subjects) {
        if !out.iter().any(|s| s.eq_ignore_ascii_case(&subject)) {
            out.push(subject);
        }
    }
    out
}

/// Derive a preview from already-resolved children.
pub fn preview_children(
    children: &[(RecordId, CatalogRecord)],
    options: &SynthesisOptions,
    local_source: &str,
) -> Preview {
    let mut ordered: Vec<(OrderKey, &RecordId, &CatalogRecord)> = children
        .iter()
        .map(|(id, rec)| (OrderKey::for_record(*id, rec), id, rec))
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0));

    let titles: Vec<String> = ordered
        .iter()
        .map(|(_, _, rec)| descriptive::normalized_title(rec))
        .collect();
    let link_lines = ordered
        .iter()
        .zip(&titles)
        .enumerate()
        .map(|(i, ((_, id, rec), title))| {
            let identifier = preferred_identifier(rec, **id, local_source);
            render_field(&schema::contains_field(i + 1, title, &identifier))
        })
        .collect();

    let records: Vec<CatalogRecord> = children.iter().map(|(_, r)| r.clone()).collect();
    let analysis = FixedFieldAnalysis::from_children(&records, &options.default_language);

    Preview {
        host_title: common_title(&titles),
        publisher: common_publisher(&records),
        year_range: analysis.year_range(),
        subjects: union_subjects(&records),
        link_lines,
        fixed_field: analysis.render(options.entered()),
        skipped: Vec::new(),
    }
}

/// Resolve `child_ids` and derive the preview. Persists nothing.
pub async fn build_preview(
    resolver: &RecordResolver,
    child_ids: &[RecordId],
    options: &SynthesisOptions,
    link_options: &LinkOptions,
) -> Result<Preview> {
    let linker = BoundwithLinker::new(resolver, link_options.clone());
    let (children, skipped) = linker.resolve_children(child_ids).await?;
    let mut preview = preview_children(&children, options, &link_options.local_source);
    preview.skipped = skipped;
    Ok(preview)
}
