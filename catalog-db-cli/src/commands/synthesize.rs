use super::link::{print_outcome, print_skipped};
use crate::cli::OutputFormat;
use crate::context;
use crate::error::CliResult;
use crate::output;
use catalog_db_api::{Catalog, HoldingsData, HostMetadata};

pub async fn run(
    catalog: &Catalog,
    title: &str,
    meta: &HostMetadata,
    children: &[String],
    holdings: Option<&HoldingsData>,
    format: OutputFormat,
) -> CliResult<()> {
    let child_ids = context::resolve_ids(catalog, children).await?;
    let outcome = catalog.synthesize_host(title, meta, &child_ids, holdings).await?;
    output::emit(format, &outcome, |o| {
        println!("Created host record {}", o.host_id);
        println!("{}", output::format_record(&o.record));
        print_outcome(&o.link);
    })
}

pub async fn run_preview(catalog: &Catalog, children: &[String], format: OutputFormat) -> CliResult<()> {
    let child_ids = context::resolve_ids(catalog, children).await?;
    let preview = catalog.build_preview(&child_ids).await?;
    output::emit(format, &preview, |p| {
        let mut pairs = vec![
            ("title", p.host_title.clone()),
            ("publisher", p.publisher.clone().unwrap_or_else(|| "-".into())),
            ("years", p.year_range.clone().unwrap_or_else(|| "-".into())),
            ("008", p.fixed_field.clone()),
        ];
        if !p.subjects.is_empty() {
            pairs.push(("subjects", p.subjects.join("; ")));
        }
        println!("{}", output::format_pairs(&pairs));
        for line in &p.link_lines {
            println!("{line}");
        }
        print_skipped(&p.skipped);
    })
}
