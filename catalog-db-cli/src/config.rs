use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use catalog_db_api::defaults::{generate_config_template, CONFIG_FILE_NAME};
use catalog_db_api::CatalogConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk up from `start` looking for `catalog.toml`.
fn find_config_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Find `catalog.toml` by walking up from cwd. Returns `None` if not found.
pub fn find_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd)
}

/// Resolve a `--config` override. Accepts the file itself or a directory
/// containing `catalog.toml`.
fn resolve_config_override(p: &Path) -> CliResult<PathBuf> {
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if resolved.is_file() {
        return Ok(resolved);
    }
    if resolved.is_dir() {
        let file = resolved.join(CONFIG_FILE_NAME);
        if file.is_file() {
            return Ok(file);
        }
    }
    Err(CliError::Config(format!(
        "config path does not exist: {}",
        p.display()
    )))
}

/// Build the effective configuration.
///
/// Precedence (highest first): CLI flags, `CATALOG_*` environment, the
/// config file, built-in defaults. Relative paths in the file are taken
/// from the file's directory; without a file, from the cwd.
pub fn load(cli: &Cli) -> CliResult<CatalogConfig> {
    let file = match cli.config.as_deref() {
        Some(p) => Some(resolve_config_override(p)?),
        None => find_config(),
    };

    let (mut config, base) = match &file {
        Some(path) => {
            let config = CatalogConfig::load(path)?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (config, base)
        }
        None => (CatalogConfig::default(), std::env::current_dir()?),
    };

    debug!(file = ?file, "loading configuration");
    config.apply_env()?;

    let mut config = config.rooted_at(&base);

    // Paths given as flags are relative to the cwd, not the config file.
    if let Some(dir) = &cli.records_dir {
        config.records_dir = std::env::current_dir()?.join(dir);
    }
    if let Some(editor) = &cli.editor {
        config.editor = editor.clone();
    }

    Ok(config)
}

/// Write a commented template to `dir/catalog.toml`.
pub fn init_config(dir: &Path, force: bool) -> CliResult<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    fs::write(&path, generate_config_template())
        .map_err(|e| CliError::Config(format!("failed to write {}: {e}", path.display())))?;
    Ok(path)
}
