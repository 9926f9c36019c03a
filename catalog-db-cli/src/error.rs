use colored::Colorize;
use std::fmt;
use std::process;

/// Exit codes for the CLI.
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Error from the catalog API layer.
    Api(catalog_db_api::ApiError),
    /// Configuration / init issues.
    Config(String),
    /// Bad file path, unreadable input, parse failure.
    Input(String),
    /// Argument / usage errors.
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Api(e) if e.is_not_found() => write!(
                f,
                "{} {e}\n  {} run 'catalog build-index' if the archives changed",
                "error:".red().bold(),
                "help:".cyan().bold(),
            ),
            CliError::Api(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Config(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Usage(msg) => write!(f, "{} {msg}", "error:".red().bold()),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<catalog_db_api::ApiError> for CliError {
    fn from(e: catalog_db_api::ApiError) -> Self {
        CliError::Api(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON error: {e}"))
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }
}

/// Print error and exit with the appropriate code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    process::exit(err.exit_code())
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(CliError::Usage("bad".into()).exit_code(), EXIT_USAGE);
        assert_eq!(CliError::Input("bad".into()).exit_code(), EXIT_ERROR);
        let not_found = CliError::Api(catalog_db_api::ApiError::not_found("record 9"));
        assert_eq!(not_found.exit_code(), EXIT_ERROR);
        assert!(not_found.to_string().contains("build-index"));
    }
}
