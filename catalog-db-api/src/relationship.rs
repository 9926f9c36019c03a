//! Boundwith relationship summary for one record.

use crate::boundwith::schema;
use crate::error::Result;
use crate::resolver::RecordResolver;
use catalog_db_core::{Identifier, RecordId};
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: RecordId,
    pub is_host: bool,
    /// Children in "contains" order; only references that resolve
    pub child_ids: Vec<RecordId>,
    pub host_id: Option<RecordId>,
    /// Link references that point at no known record
    pub unresolved: Vec<String>,
}

async fn resolve_reference(resolver: &RecordResolver, reference: &str) -> Result<Option<RecordId>> {
    // A local identifier is trusted only when the id actually resolves.
    if let Some(Identifier::Local { id, .. }) = Identifier::parse(reference) {
        return match resolver.resolve(id, true).await {
            Ok(_) => Ok(Some(id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        };
    }
    match resolver.resolve_by_external_identifier(reference).await {
        Ok((_, id)) => Ok(Some(id)),
        Err(e) if e.is_not_found() || e.is_client_error() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read the link fields of `id` and map their references back to ids.
pub async fn lookup(resolver: &RecordResolver, id: RecordId) -> Result<Relationship> {
    let record = resolver.resolve(id, true).await?;
    let mut out = Relationship {
        id,
        is_host: false,
        child_ids: Vec::new(),
        host_id: None,
        unresolved: Vec::new(),
    };

    let contained = schema::contained_references(&record);
    out.is_host = !contained.is_empty();
    for reference in contained {
        match resolve_reference(resolver, &reference).await? {
            Some(child) => out.child_ids.push(child),
            None => {
                debug!(record_id = %id, reference = %reference, "contained reference does not resolve");
                out.unresolved.push(reference);
            }
        }
    }

    if let Some(reference) = schema::host_reference(&record) {
        match resolve_reference(resolver, &reference).await? {
            Some(host) => out.host_id = Some(host),
            None => out.unresolved.push(reference),
        }
    }
    Ok(out)
}
