use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output;
use catalog_db_api::{Catalog, SearchQuery};

pub async fn run(
    catalog: &Catalog,
    sudoc: Option<String>,
    title: Option<String>,
    limit: usize,
    offset: usize,
    format: OutputFormat,
) -> CliResult<()> {
    if sudoc.is_none() && title.is_none() {
        return Err(CliError::Usage("search needs --sudoc and/or --title".into()));
    }
    let query = SearchQuery {
        sudoc,
        title,
        limit,
        offset,
    };
    let hits = catalog.search(query).await?;
    output::emit(format, &hits, |hits| {
        for hit in hits {
            println!(
                "{:>8}  {:<20}  {}",
                hit.id,
                hit.sudoc.as_deref().unwrap_or("-"),
                hit.title.as_deref().unwrap_or("-")
            );
        }
    })
}
