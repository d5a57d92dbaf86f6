//! Catalog configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the config directory overrides any
//! subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! data_file = "data/data.json"   # Snapshot file, relative to the config dir
//!
//! [seed]
//! username = "stock"             # User created on first run
//! album = "Stock Album"          # Album filled from image_dir
//! image_dir = "data/stock"       # Scanned for jpg/png/gif/bmp on first run
//!
//! [tag_types]
//! unrestricted = ["Person", "Item"]
//! restricted = ["Place"]         # At most one tag of these types per photo
//! ```
//!
//! ## Partial Configuration
//!
//! Override just the values you want:
//!
//! ```toml
//! [seed]
//! image_dir = "/srv/photos/samples"
//! ```
//!
//! Relative paths resolve against the config directory. Unknown keys are
//! rejected to catch typos early.

use crate::scan::Seed;
use crate::tags::{DEFAULT_RESTRICTED, DEFAULT_UNRESTRICTED, TagTypeRegistry, names_match};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Catalog configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Snapshot file location.
    pub data_file: PathBuf,
    /// First-run user and album.
    pub seed: SeedConfig,
    /// Tag types a fresh catalog starts with.
    pub tag_types: TagTypesConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/data.json"),
            seed: SeedConfig::default(),
            tag_types: TagTypesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    pub username: String,
    pub album: String,
    pub image_dir: PathBuf,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            username: "stock".to_string(),
            album: "Stock Album".to_string(),
            image_dir: PathBuf::from("data/stock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagTypesConfig {
    pub unrestricted: Vec<String>,
    pub restricted: Vec<String>,
}

impl Default for TagTypesConfig {
    fn default() -> Self {
        Self {
            unrestricted: DEFAULT_UNRESTRICTED.iter().map(|s| s.to_string()).collect(),
            restricted: DEFAULT_RESTRICTED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TagTypesConfig {
    pub fn registry(&self) -> TagTypeRegistry {
        TagTypeRegistry::from_lists(&self.unrestricted, &self.restricted)
    }
}

impl CatalogConfig {
    /// Validate that required names are present and tag types are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation("data_file must not be empty".into()));
        }
        if self.seed.username.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed.username must not be empty".into(),
            ));
        }
        if self.seed.album.trim().is_empty() {
            return Err(ConfigError::Validation("seed.album must not be empty".into()));
        }
        if self
            .tag_types
            .unrestricted
            .iter()
            .chain(&self.tag_types.restricted)
            .any(|t| t.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "tag_types entries must not be blank".into(),
            ));
        }
        if let Some(both) = self
            .tag_types
            .unrestricted
            .iter()
            .find(|u| self.tag_types.restricted.iter().any(|r| names_match(u, r)))
        {
            return Err(ConfigError::Validation(format!(
                "tag type '{both}' is listed as both restricted and unrestricted"
            )));
        }
        Ok(())
    }

    /// Snapshot path, resolved against `base` when relative.
    pub fn data_path(&self, base: &Path) -> PathBuf {
        base.join(&self.data_file)
    }

    /// First-run seed with paths resolved against `base`.
    pub fn seed(&self, base: &Path) -> Seed {
        Seed {
            username: self.seed.username.trim().to_string(),
            album: self.seed.album.trim().to_string(),
            image_dir: base.join(&self.seed.image_dir),
            tag_types: self.tag_types.registry(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `config.toml` from `dir` as a raw value, if present.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CatalogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for `dir`: stock defaults overridden by `dir/config.toml`.
pub fn load_config(dir: &Path) -> Result<CatalogConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// A fully commented `config.toml` showing every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Catalog Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths resolve against the directory holding this file.
# Unknown keys will cause an error.

# Where the catalog snapshot (users, albums, photos, tag types) is stored.
data_file = "data/data.json"

# ---------------------------------------------------------------------------
# First run
# ---------------------------------------------------------------------------
# When data_file does not exist yet, the catalog starts with one user owning
# one album filled from image_dir (jpg, png, gif, bmp; not recursive).
[seed]
username = "stock"
album = "Stock Album"
image_dir = "data/stock"

# ---------------------------------------------------------------------------
# Tag types
# ---------------------------------------------------------------------------
# The tag types a fresh catalog knows. A photo holds at most one tag of each
# restricted type. Names compare case-insensitively.
[tag_types]
unrestricted = ["Person", "Item"]
restricted = ["Place"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = CatalogConfig::default();
        assert_eq!(config.data_file, PathBuf::from("data/data.json"));
        assert_eq!(config.seed.username, "stock");
        assert_eq!(config.seed.album, "Stock Album");
        assert_eq!(config.tag_types.restricted, vec!["Place"]);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[seed]
album = "Samples"
"#;
        let config: CatalogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.seed.album, "Samples");
        // Defaults preserved
        assert_eq!(config.seed.username, "stock");
        assert_eq!(config.data_file, PathBuf::from("data/data.json"));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<CatalogConfig, _> = toml::from_str("colour = \"red\"");
        assert!(result.is_err());
        let nested: Result<CatalogConfig, _> = toml::from_str("[seed]\nuser = \"x\"");
        assert!(nested.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), CatalogConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
data_file = "catalog.json"

[tag_types]
unrestricted = ["Person", "Event"]
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.data_file, PathBuf::from("catalog.json"));
        assert_eq!(config.tag_types.unrestricted, vec!["Person", "Event"]);
        // Untouched section keeps its default
        assert_eq!(config.tag_types.restricted, vec!["Place"]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_overlay_replaces_leaf_and_keeps_siblings() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[seed]\nusername = \"demo\"").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.seed.username, "demo");
        assert_eq!(config.seed.album, "Stock Album");
    }

    #[test]
    fn merge_arrays_replace_entirely() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[tag_types]\nrestricted = []").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert!(config.tag_types.restricted.is_empty());
        assert_eq!(config.tag_types.unrestricted, vec!["Person", "Item"]);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_blank_seed_user() {
        let mut config = CatalogConfig::default();
        config.seed.username = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_type_in_both_lists() {
        let mut config = CatalogConfig::default();
        config.tag_types.unrestricted.push("place".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("place"), "{err}");
    }

    #[test]
    fn validate_rejects_blank_tag_type() {
        let mut config = CatalogConfig::default();
        config.tag_types.restricted.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_data_file() {
        let mut config = CatalogConfig::default();
        config.data_file = PathBuf::new();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    #[test]
    fn seed_resolves_paths_against_base() {
        let config = CatalogConfig::default();
        let seed = config.seed(Path::new("/srv/catalog"));
        assert_eq!(seed.image_dir, PathBuf::from("/srv/catalog/data/stock"));
        assert!(seed.tag_types.is_restricted("Place"));
        assert!(seed.tag_types.contains("Item"));
    }

    #[test]
    fn absolute_data_file_is_kept() {
        let mut config = CatalogConfig::default();
        config.data_file = PathBuf::from("/var/lib/catalog.json");
        assert_eq!(
            config.data_path(Path::new("/etc")),
            PathBuf::from("/var/lib/catalog.json")
        );
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let parsed: CatalogConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, CatalogConfig::default());
    }
}
