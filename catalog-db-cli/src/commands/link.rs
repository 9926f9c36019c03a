use crate::cli::OutputFormat;
use crate::context;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::{Catalog, HoldingsData, LinkOutcome, SkippedChild};
use colored::Colorize;

pub(crate) fn print_skipped(skipped: &[SkippedChild]) {
    for s in skipped {
        println!("{} skipped {}: {}", "warning:".yellow().bold(), s.id, s.reason);
    }
}

pub(crate) fn print_outcome(outcome: &LinkOutcome) {
    println!(
        "Linked {} children to host {} ({})",
        outcome.child_ids.len(),
        outcome.host_id,
        outcome.host_identifier
    );
    for (i, child) in outcome.child_ids.iter().enumerate() {
        println!("  {:>3}. {child}", i + 1);
    }
    print_skipped(&outcome.skipped);
}

pub async fn run(
    catalog: &Catalog,
    host: &str,
    children: &[String],
    holdings: Option<&HoldingsData>,
    format: OutputFormat,
) -> CliResult<()> {
    let host_id = context::resolve_id(catalog, host).await?;
    let child_ids = context::resolve_ids(catalog, children).await?;
    let outcome = catalog.link(host_id, &child_ids, holdings).await?;
    output::emit(format, &outcome, print_outcome)
}
