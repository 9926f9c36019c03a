use crate::cli::OutputFormat;
use crate::context;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::Catalog;

pub async fn run(catalog: &Catalog, id: &str, format: OutputFormat) -> CliResult<()> {
    let id = context::resolve_id(catalog, id).await?;
    let versions = catalog.history(id).await?;
    output::emit(format, &versions, |versions| {
        if versions.is_empty() {
            println!("record {id} has no edits");
            return;
        }
        for v in versions {
            println!("{:>6}  {}  {}", v.seq, v.edited_at.to_rfc3339(), v.editor);
        }
    })
}
