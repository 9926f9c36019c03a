//! Catalog CLI library.
//!
//! Types, command handlers and helpers behind the `catalog` binary. Other
//! front ends can build a [`Cli`](cli::Cli) programmatically and call
//! [`run`], or call the handlers in [`commands`] directly.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod output;

use catalog_db_api::HostMetadata;
use cli::{Cli, Commands};

/// Dispatch a parsed [`Cli`] to the appropriate command handler.
pub async fn run(cli: Cli) -> error::CliResult<()> {
    let format = cli.format;

    if let Commands::Init { force } = &cli.command {
        return commands::init::run(*force);
    }

    let config = config::load(&cli)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),

        Commands::BuildIndex => {
            let catalog = context::build_catalog(config)?;
            commands::build_index::run(&catalog, format).await
        }

        Commands::Show { record, original } => {
            let catalog = context::build_catalog(config)?;
            commands::show::run(&catalog, &record, original, format).await
        }

        Commands::Fields {
            id,
            sorted,
            original,
        } => {
            let catalog = context::build_catalog(config)?;
            commands::fields::run_list(&catalog, &id, sorted, original, format).await
        }

        Commands::SetField { id, index, field } => {
            let catalog = context::build_catalog(config)?;
            commands::fields::run_set(&catalog, &id, index, &field, format).await
        }

        Commands::AddField { id, field } => {
            let catalog = context::build_catalog(config)?;
            commands::fields::run_add(&catalog, &id, &field, format).await
        }

        Commands::DeleteField { id, index } => {
            let catalog = context::build_catalog(config)?;
            commands::fields::run_delete(&catalog, &id, index, format).await
        }

        Commands::Link {
            host,
            children,
            skip_missing,
            holdings,
        } => {
            let catalog = context::build_linking_catalog(config, skip_missing)?;
            let holdings = input::holdings(&holdings);
            commands::link::run(&catalog, &host, &children, holdings.as_ref(), format).await
        }

        Commands::Synthesize {
            children,
            title,
            place,
            publisher,
            series,
            subjects,
            note,
            extent,
            skip_missing,
            holdings,
        } => {
            let catalog = context::build_linking_catalog(config, skip_missing)?;
            let meta = HostMetadata {
                place,
                publisher,
                series,
                subjects,
                note,
                extent,
            };
            let holdings = input::holdings(&holdings);
            commands::synthesize::run(&catalog, &title, &meta, &children, holdings.as_ref(), format)
                .await
        }

        Commands::Preview {
            children,
            skip_missing,
        } => {
            let catalog = context::build_linking_catalog(config, skip_missing)?;
            commands::synthesize::run_preview(&catalog, &children, format).await
        }

        Commands::Lookup { id } => {
            let catalog = context::build_catalog(config)?;
            commands::lookup::run(&catalog, &id, format).await
        }

        Commands::Search {
            sudoc,
            title,
            limit,
            offset,
        } => {
            let catalog = context::build_catalog(config)?;
            commands::search::run(&catalog, sudoc, title, limit, offset, format).await
        }

        Commands::Export { ids, output } => {
            let catalog = context::build_catalog(config)?;
            commands::export::run(&catalog, &ids, output.as_deref(), cli.quiet).await
        }

        Commands::History { id } => {
            let catalog = context::build_catalog(config)?;
            commands::history::run(&catalog, &id, format).await
        }
    }
}
