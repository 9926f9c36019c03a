use crate::cli::{FieldArgs, OutputFormat};
use crate::context;
use crate::error::CliResult;
use crate::input;
use crate::output;
use catalog_db_api::{Catalog, CatalogRecord, FieldOrder};
use serde::Serialize;

pub async fn run_list(
    catalog: &Catalog,
    id: &str,
    sorted: bool,
    original: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let id = context::resolve_id(catalog, id).await?;
    let order = if sorted {
        FieldOrder::Sorted
    } else {
        FieldOrder::Original
    };
    let views = catalog.get_fields(id, !original, order).await?;
    output::emit(format, &views, |views| {
        println!("{}", output::format_field_views(views))
    })
}

#[derive(Serialize)]
struct Edited<'a> {
    id: catalog_db_api::RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    record: &'a CatalogRecord,
}

fn print_edited(format: OutputFormat, edited: &Edited<'_>, verb: &str) -> CliResult<()> {
    output::emit(format, edited, |e| {
        match e.index {
            Some(i) => println!("{verb} field {i} of record {}", e.id),
            None => println!("{verb} record {}", e.id),
        }
        println!("{}", output::format_record(e.record));
    })
}

pub async fn run_set(
    catalog: &Catalog,
    id: &str,
    index: usize,
    field: &FieldArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let input = input::field_input(field)?;
    let id = context::resolve_id(catalog, id).await?;
    let record = catalog.update_field(id, index, &input).await?;
    print_edited(
        format,
        &Edited {
            id,
            index: Some(index),
            record: &record,
        },
        "Updated",
    )
}

pub async fn run_add(catalog: &Catalog, id: &str, field: &FieldArgs, format: OutputFormat) -> CliResult<()> {
    let input = input::field_input(field)?;
    let id = context::resolve_id(catalog, id).await?;
    let (record, index) = catalog.add_field(id, &input).await?;
    print_edited(
        format,
        &Edited {
            id,
            index: Some(index),
            record: &record,
        },
        "Added",
    )
}

pub async fn run_delete(catalog: &Catalog, id: &str, index: usize, format: OutputFormat) -> CliResult<()> {
    let id = context::resolve_id(catalog, id).await?;
    let record = catalog.delete_field(id, index).await?;
    print_edited(
        format,
        &Edited {
            id,
            index: None,
            record: &record,
        },
        "Deleted a field from",
    )
}
