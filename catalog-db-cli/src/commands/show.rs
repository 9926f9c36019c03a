use crate::cli::OutputFormat;
use crate::context;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::Catalog;

pub async fn run(catalog: &Catalog, record: &str, original: bool, format: OutputFormat) -> CliResult<()> {
    let id = context::resolve_id(catalog, record).await?;
    let resolved = catalog.resolve_with_source(id, !original).await?;
    output::emit(format, &resolved, |r| {
        println!("# record {} ({:?})", r.id, r.source);
        println!("{}", output::format_record(&r.record));
    })
}
