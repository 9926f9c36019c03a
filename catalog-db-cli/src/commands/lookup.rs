use crate::cli::OutputFormat;
use crate::context;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::Catalog;

pub async fn run(catalog: &Catalog, id: &str, format: OutputFormat) -> CliResult<()> {
    let id = context::resolve_id(catalog, id).await?;
    let rel = catalog.lookup(id).await?;
    output::emit(format, &rel, |rel| {
        let join = |ids: &[catalog_db_api::RecordId]| {
            ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        };
        let mut pairs = vec![
            ("id", rel.id.to_string()),
            ("is_host", rel.is_host.to_string()),
            ("children", join(&rel.child_ids)),
            (
                "host",
                rel.host_id.map(|h| h.to_string()).unwrap_or_else(|| "-".into()),
            ),
        ];
        if !rel.unresolved.is_empty() {
            pairs.push(("unresolved", rel.unresolved.join(", ")));
        }
        println!("{}", output::format_pairs(&pairs));
    })
}
