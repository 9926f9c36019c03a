use crate::error::{CliError, CliResult};
use crate::input::{parse_record_ref, RecordRef};
use catalog_db_api::{Catalog, CatalogConfig, MissingChildPolicy, RecordId};

/// Open the catalog named by `config`.
pub fn build_catalog(config: CatalogConfig) -> CliResult<Catalog> {
    Ok(Catalog::open(config)?)
}

/// Open the catalog for a linking command.
pub fn build_linking_catalog(mut config: CatalogConfig, skip_missing: bool) -> CliResult<Catalog> {
    if skip_missing {
        config.link.missing_child = MissingChildPolicy::Skip;
    }
    build_catalog(config)
}

/// Turn a command-line record reference into an id.
pub async fn resolve_id(catalog: &Catalog, raw: &str) -> CliResult<RecordId> {
    match parse_record_ref(raw)? {
        RecordRef::Id(id) => Ok(id),
        RecordRef::External(identifier) => {
            let (_, id) = catalog.resolve_by_external_identifier(&identifier).await?;
            Ok(id)
        }
    }
}

pub async fn resolve_ids(catalog: &Catalog, raw: &[String]) -> CliResult<Vec<RecordId>> {
    let mut ids = Vec::with_capacity(raw.len());
    for r in raw {
        ids.push(resolve_id(catalog, r).await?);
    }
    if ids.is_empty() {
        return Err(CliError::Usage("at least one record is required".into()));
    }
    Ok(ids)
}
