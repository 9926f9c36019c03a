use crate::context;
use crate::error::{CliError, CliResult};
use catalog_db_api::Catalog;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

pub async fn run(catalog: &Catalog, ids: &[String], out: Option<&Path>, quiet: bool) -> CliResult<()> {
    let ids = context::resolve_ids(catalog, ids).await?;
    let export = catalog.export(&ids).await?;

    match out {
        Some(path) => std::fs::write(path, &export.data)
            .map_err(|e| CliError::Input(format!("failed to write {}: {e}", path.display())))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&export.data)?;
            stdout.flush()?;
        }
    }

    if !quiet {
        for id in &export.skipped {
            eprintln!("{} record {id} not exported", "warning:".yellow().bold());
        }
        if let Some(path) = out {
            eprintln!("Exported {} records to {}", export.written.len(), path.display());
        }
    }
    Ok(())
}
