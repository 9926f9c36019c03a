use catalog_db_cli::cli::Cli;
use catalog_db_cli::error::exit_with_error;
use clap::Parser;

fn init_tracing(cli: &Cli) {
    // --quiet → off; --verbose → RUST_LOG or info; default → warn so skipped
    // records and children still reach stderr.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    let ansi = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Errors go to stderr, so a piped stdout alone does not disable color.
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_tracing(&cli);

    if let Err(e) = catalog_db_cli::run(cli).await {
        exit_with_error(e);
    }
}
