//! Default values for catalog configuration.
//!
//! These constants are the single source of truth shared between
//! [`CatalogConfig::default`](crate::CatalogConfig) and the `catalog init`
//! config template.

// ── Paths ───────────────────────────────────────────────────────────

pub const DEFAULT_RECORDS_DIR: &str = "records";
pub const DEFAULT_INDEX_PATH: &str = ".catalog/index.db";
pub const DEFAULT_OVERLAY_PATH: &str = ".catalog/overlay.db";

// ── Resolution ──────────────────────────────────────────────────────

pub const DEFAULT_CACHE_CAPACITY: usize = catalog_db_archive::DEFAULT_CACHE_CAPACITY;
pub const DEFAULT_EDITOR: &str = "catalog";

// ── Linking ─────────────────────────────────────────────────────────

pub const DEFAULT_MISSING_CHILD: &str = "abort";
pub const DEFAULT_LOCAL_SOURCE: &str = catalog_db_core::DEFAULT_LOCAL_SOURCE;

// ── Synthesis ───────────────────────────────────────────────────────

pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_CATALOGING_AGENCY: &str = "CatDB";

// ── Environment ─────────────────────────────────────────────────────

pub const ENV_RECORDS_DIR: &str = "CATALOG_RECORDS_DIR";
pub const ENV_INDEX_PATH: &str = "CATALOG_INDEX_PATH";
pub const ENV_OVERLAY_PATH: &str = "CATALOG_OVERLAY_PATH";
pub const ENV_CACHE_CAPACITY: &str = "CATALOG_CACHE_CAPACITY";
pub const ENV_EDITOR: &str = "CATALOG_EDITOR";

/// Config file name written by `catalog init`.
pub const CONFIG_FILE_NAME: &str = "catalog.toml";

// ── Template generation ─────────────────────────────────────────────

/// Generate a commented-out TOML config template using the canonical
/// default values above.  Written by `catalog init`.
pub fn generate_config_template() -> String {
    format!(
        r#"# Catalog Configuration
#
# Precedence (highest to lowest):
#   1. CLI arguments
#   2. Environment variables (CATALOG_*)
#   3. This file
#   4. Built-in defaults

# records_dir = "{records_dir}"          # directory of *.zip archives
# index_path = "{index_path}"
# overlay_path = "{overlay_path}"
# cache_capacity = {cache_capacity}              # parsed archival records kept in memory
# editor = "{editor}"

# [link]
# missing_child = "{missing_child}"              # abort, skip
# local_source = "{local_source}"

# [synthesis]
# default_language = "{language}"
# cataloging_agency = "{agency}"
"#,
        records_dir = DEFAULT_RECORDS_DIR,
        index_path = DEFAULT_INDEX_PATH,
        overlay_path = DEFAULT_OVERLAY_PATH,
        cache_capacity = DEFAULT_CACHE_CAPACITY,
        editor = DEFAULT_EDITOR,
        missing_child = DEFAULT_MISSING_CHILD,
        local_source = DEFAULT_LOCAL_SOURCE,
        language = DEFAULT_LANGUAGE,
        agency = DEFAULT_CATALOGING_AGENCY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_as_toml() {
        let template = generate_config_template();
        let parsed: toml::Value = toml::from_str(&template).unwrap();
        // Everything is commented out.
        assert!(parsed.as_table().unwrap().is_empty());
    }

    #[test]
    fn uncommented_template_is_a_valid_config() {
        let uncommented: String = generate_config_template()
            .lines()
            .filter(|l| l.starts_with("# ") && (l.contains('=') || l.starts_with("# [")))
            .map(|l| l.trim_start_matches("# "))
            .map(|l| l.split(" #").next().unwrap_or(l))
            .collect::<Vec<_>>()
            .join("\n");
        let config: crate::CatalogConfig = toml::from_str(&uncommented).unwrap();
        assert_eq!(config, crate::CatalogConfig::default());
    }
}
