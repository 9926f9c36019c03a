//! Catalog configuration
//!
//! Loaded from TOML, then overridden by `CATALOG_*` environment variables;
//! the CLI applies its own flags last.

use crate::boundwith::MissingChildPolicy;
use crate::defaults::*;
use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the `*.zip` archives
    pub records_dir: PathBuf,
    /// SQLite archive index
    pub index_path: PathBuf,
    /// SQLite overlay store
    pub overlay_path: PathBuf,
    /// Parsed archival records kept in the LRU cache
    pub cache_capacity: usize,
    /// Editor recorded on overlay writes when the caller names none
    pub editor: String,
    pub link: LinkConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub missing_child: MissingChildPolicy,
    /// Source code for control-number and local-fallback identifiers
    pub local_source: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Language used when no child declares one
    pub default_language: String,
    /// 040 `$a`/`$c` of synthesized hosts
    pub cataloging_agency: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from(DEFAULT_RECORDS_DIR),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            overlay_path: PathBuf::from(DEFAULT_OVERLAY_PATH),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            editor: DEFAULT_EDITOR.to_string(),
            link: LinkConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            missing_child: MissingChildPolicy::default(),
            local_source: DEFAULT_LOCAL_SOURCE.to_string(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            cataloging_agency: DEFAULT_CATALOGING_AGENCY.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ApiError::config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply `CATALOG_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_RECORDS_DIR) {
            self.records_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_INDEX_PATH) {
            self.index_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_OVERLAY_PATH) {
            self.overlay_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_CACHE_CAPACITY) {
            self.cache_capacity = v.trim().parse().map_err(|_| {
                ApiError::config(format!("{ENV_CACHE_CAPACITY} must be a non-negative integer, got {v:?}"))
            })?;
        }
        if let Some(v) = get(ENV_EDITOR) {
            self.editor = v;
        }
        Ok(())
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for path in [&mut self.records_dir, &mut self.index_path, &mut self.overlay_path] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
