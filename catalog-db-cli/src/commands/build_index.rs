use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::Catalog;
use colored::Colorize;

pub async fn run(catalog: &Catalog, format: OutputFormat) -> CliResult<()> {
    let report = catalog.rebuild_index().await?;
    output::emit(format, &report, |r| {
        println!(
            "Indexed {} records from {} archives ({} data files)",
            r.indexed, r.ingest.archives, r.ingest.data_files
        );
        if r.ingest.skipped > 0 {
            println!("{} {} malformed records skipped", "warning:".yellow().bold(), r.ingest.skipped);
        }
        for failed in &r.ingest.failed {
            println!("{} could not read {failed}", "warning:".yellow().bold());
        }
    })
}
