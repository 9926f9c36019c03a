//! Boundwith linking between a host record and its children.
//!
//! A link is not a separate relation: it lives in the records as one
//! "contains" field per child on the host and one "bound with" field on each
//! child. Relinking strips every previously written link encoding before
//! adding fresh ones, so repeated runs never accumulate duplicates.
//!
//! Writes go through the overlay store, children first, host last. A child
//! whose write fails is left out and the host ordinals are renumbered over
//! the children that were written.

pub mod ordering;
pub mod schema;

use crate::error::{ApiError, Result};
use crate::fields::ordered_position;
use crate::resolver::RecordResolver;
use catalog_db_core::{
    descriptive, preferred_identifier, CatalogRecord, Field, Identifier, Indicators, RecordId, Tag,
    DEFAULT_LOCAL_SOURCE,
};
use ordering::OrderKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

pub const HOLDINGS_TAG: Tag = Tag::from_static(b"852");

/// What to do with a child id that does not resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingChildPolicy {
    /// Fail the whole link with NotFound
    #[default]
    Abort,
    /// Drop the child, log it and report it in [`LinkOutcome::skipped`]
    Skip,
}

/// Physical-item data attached to the host as an 852.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingsData {
    pub barcode: Option<String>,
    pub call_number: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
}

impl HoldingsData {
    pub fn is_empty(&self) -> bool {
        [&self.barcode, &self.call_number, &self.location, &self.note]
            .iter()
            .all(|v| v.as_deref().map(str::trim).unwrap_or("").is_empty())
    }

    /// `852 $b location $h call number $p barcode $z note`
    pub fn to_field(&self) -> Option<Field> {
        if self.is_empty() {
            return None;
        }
        let mut field = Field::data(HOLDINGS_TAG, Indicators::BLANK);
        for (code, value) in [
            ('b', &self.location),
            ('h', &self.call_number),
            ('p', &self.barcode),
            ('z', &self.note),
        ] {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                field = field.subfield(code, v);
            }
        }
        Some(field)
    }
}

/// Replace any 852 with the same barcode, then insert the new one in tag order.
pub fn attach_holdings(record: &mut CatalogRecord, holdings: &HoldingsData) -> bool {
    let Some(field) = holdings.to_field() else {
        return false;
    };
    if let Some(barcode) = field.first('p').map(str::to_string) {
        record.retain(|f| !(f.tag == HOLDINGS_TAG && f.first('p') == Some(barcode.as_str())));
    }
    let at = ordered_position(record, &HOLDINGS_TAG);
    record.fields.insert(at, field);
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    pub missing_child: MissingChildPolicy,
    pub local_source: String,
    pub editor: String,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            missing_child: MissingChildPolicy::default(),
            local_source: DEFAULT_LOCAL_SOURCE.to_string(),
            editor: crate::defaults::DEFAULT_EDITOR.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedChild {
    pub id: RecordId,
    pub reason: String,
}

/// Result of a link operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    pub host_id: RecordId,
    /// Linked children in ordinal order
    pub child_ids: Vec<RecordId>,
    pub skipped: Vec<SkippedChild>,
    pub host_identifier: String,
}

/// A child with its link computed but not yet written.
#[derive(Clone, Debug)]
pub struct PlannedChild {
    pub id: RecordId,
    pub identifier: Identifier,
    pub title: String,
    /// Child record with prior links stripped and the new "bound with" added
    pub record: CatalogRecord,
    key: OrderKey,
}

/// Compute each child's link, sorted into ordinal order.
pub fn plan_children(
    host: &CatalogRecord,
    host_id: RecordId,
    children: Vec<(RecordId, CatalogRecord)>,
    local_source: &str,
) -> Vec<PlannedChild> {
    let host_identifier = preferred_identifier(host, host_id, local_source);
    let host_title = descriptive::normalized_title(host);

    let mut planned: Vec<PlannedChild> = children
        .into_iter()
        .map(|(id, mut record)| {
            let key = OrderKey::for_record(id, &record);
            let identifier = preferred_identifier(&record, id, local_source);
            let title = descriptive::normalized_title(&record);
            schema::strip_child_links(&mut record);
            let link = schema::bound_with_field(&host_title, &host_identifier);
            let at = ordered_position(&record, &link.tag);
            record.fields.insert(at, link);
            PlannedChild {
                id,
                identifier,
                title,
                record,
                key,
            }
        })
        .collect();
    planned.sort_by(|a, b| a.key.cmp(&b.key));
    planned
}

/// Strip the host's prior links and add one "contains" per child, numbered
/// from 1 in the given order.
pub fn apply_host_links(host: &mut CatalogRecord, children: &[PlannedChild]) {
    schema::strip_host_links(host);
    for (i, child) in children.iter().enumerate() {
        let field = schema::contains_field(i + 1, &child.title, &child.identifier);
        let at = ordered_position(host, &field.tag);
        host.fields.insert(at, field);
    }
}

/// Maintains boundwith links through a shared resolver.
#[derive(Debug)]
pub struct BoundwithLinker<'a> {
    resolver: &'a RecordResolver,
    options: LinkOptions,
}

impl<'a> BoundwithLinker<'a> {
    pub fn new(resolver: &'a RecordResolver, options: LinkOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    /// Reject self-links and drop repeated child ids, keeping first occurrence.
    fn validate(host_id: RecordId, child_ids: &[RecordId]) -> Result<Vec<RecordId>> {
        if child_ids.is_empty() {
            return Err(ApiError::bad_request("a boundwith link needs at least one child"));
        }
        if child_ids.contains(&host_id) {
            return Err(ApiError::bad_request(format!(
                "record {host_id} cannot be bound with itself"
            )));
        }
        let mut seen = HashSet::new();
        Ok(child_ids.iter().copied().filter(|id| seen.insert(*id)).collect())
    }

    /// Resolve children under the missing-child policy.
    pub async fn resolve_children(
        &self,
        child_ids: &[RecordId],
    ) -> Result<(Vec<(RecordId, CatalogRecord)>, Vec<SkippedChild>)> {
        let mut resolved = Vec::with_capacity(child_ids.len());
        let mut skipped = Vec::new();
        for &id in child_ids {
            match self.resolver.resolve(id, true).await {
                Ok(record) => resolved.push((id, record)),
                Err(e) if e.is_not_found() && self.options.missing_child == MissingChildPolicy::Skip => {
                    warn!(record_id = %id, error = %e, "skipping unresolved child");
                    skipped.push(SkippedChild {
                        id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        if resolved.is_empty() {
            return Err(ApiError::not_found("none of the child records could be resolved"));
        }
        Ok((resolved, skipped))
    }

    /// Link `host_id` with `child_ids`, optionally attaching holdings to the host.
    pub async fn link(
        &self,
        host_id: RecordId,
        child_ids: &[RecordId],
        holdings: Option<&HoldingsData>,
    ) -> Result<LinkOutcome> {
        let child_ids = Self::validate(host_id, child_ids)?;
        let mut host = self.resolver.resolve(host_id, true).await?;
        let (children, mut skipped) = self.resolve_children(&child_ids).await?;

        let planned = plan_children(&host, host_id, children, &self.options.local_source);
        let editor = self.options.editor.as_str();

        let mut written = Vec::with_capacity(planned.len());
        for child in planned {
            match self.resolver.save(child.id, &child.record, editor).await {
                Ok(()) => written.push(child),
                Err(e) => {
                    warn!(record_id = %child.id, error = %e, "failed to save child; leaving it out");
                    skipped.push(SkippedChild {
                        id: child.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if written.is_empty() {
            return Err(ApiError::internal("no child record could be saved"));
        }

        apply_host_links(&mut host, &written);
        if let Some(holdings) = holdings {
            attach_holdings(&mut host, holdings);
        }
        self.resolver.save(host_id, &host, editor).await?;

        let host_identifier = preferred_identifier(&host, host_id, &self.options.local_source);
        info!(
            host_id = %host_id,
            children = written.len(),
            skipped = skipped.len(),
            "boundwith link written"
        );
        Ok(LinkOutcome {
            host_id,
            child_ids: written.iter().map(|c| c.id).collect(),
            skipped,
            host_identifier: host_identifier.to_string(),
        })
    }
}
