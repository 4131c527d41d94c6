//! Application configuration.
//!
//! Configuration is layered, each layer overriding the one before:
//!
//! 1. Stock defaults ([`AppConfig::default`])
//! 2. `config.toml` in the config directory (optional, sparse)
//! 3. Environment variables (`MEMORIES_DB_PATH`, `MEMORIES_UPLOADS_DIR`,
//!    `MEMORIES_LOG_LEVEL`)
//!
//! The merged result is deserialized and validated once, so the rest of the
//! program only ever sees a complete, checked [`AppConfig`].
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! database = "data/memories.db"   # SQLite file, parent dirs created on open
//! uploads_dir = "data/uploads"    # Root of /uploads/<slug>/<file>
//!
//! [images]
//! jpeg_quality = 90               # Re-encode quality for sanitized JPEGs (1-100)
//!
//! [logging]
//! level = "info"                  # trace | debug | info | warn | error
//! ```
//!
//! Unknown keys are rejected to catch typos early. Blank environment
//! variables are ignored rather than clearing a setting.

use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "MEMORIES_DB_PATH";
pub const ENV_UPLOADS_DIR: &str = "MEMORIES_UPLOADS_DIR";
pub const ENV_LOG_LEVEL: &str = "MEMORIES_LOG_LEVEL";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml` and the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Database and upload locations.
    pub storage: StorageConfig,
    /// Upload sanitizing settings.
    pub images: ImagesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub uploads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/memories.db"),
            uploads_dir: PathBuf::from("data/uploads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::default().value(),
        }
    }
}

impl ImagesConfig {
    /// Encoder quality. Range checking happens in [`AppConfig::validate`].
    pub fn quality(&self) -> Quality {
        Quality::new(self.jpeg_quality)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.storage.database.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.database must not be empty".into(),
            ));
        }
        if self.storage.uploads_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.uploads_dir must not be empty".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build an overlay from environment variables, looked up through `lookup`.
///
/// Blank values are skipped.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> toml::Value {
    let mut root = toml::Table::new();
    let mut set = |section: &str, key: &str, var: &str| {
        let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            return;
        };
        let table = root
            .entry(section)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if let toml::Value::Table(table) = table {
            table.insert(key.to_string(), toml::Value::String(value.trim().to_string()));
        }
    };
    set("storage", "database", ENV_DB_PATH);
    set("storage", "uploads_dir", ENV_UPLOADS_DIR);
    set("logging", "level", ENV_LOG_LEVEL);
    toml::Value::Table(root)
}

/// Merge overlays in order onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value()?, merge_toml);
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, then apply the process
/// environment.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    load_config_with_env(dir, |var| std::env::var(var).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with_env(
    dir: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let file = load_raw_config(dir)?;
    let config = resolve_config(file.into_iter().chain([env_overlay(lookup)]))?;
    tracing::debug!(dir = %dir.display(), ?config, "configuration loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Memories Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   MEMORIES_DB_PATH      -> storage.database
#   MEMORIES_UPLOADS_DIR  -> storage.uploads_dir
#   MEMORIES_LOG_LEVEL    -> logging.level
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# SQLite database file. Parent directories are created on first open.
database = "data/memories.db"

# Uploaded photos land in <uploads_dir>/<album-slug>/<generated-name>
# and are served as /uploads/<album-slug>/<generated-name>.
uploads_dir = "data/uploads"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# JPEG uploads are decoded, rotated upright, and re-encoded without
# metadata (no GPS, no camera identifiers). Quality of that re-encode
# (1 = worst, 100 = best). Other formats are stored as uploaded.
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# One of: trace, debug, info, warn, error. RUST_LOG takes precedence.
level = "info"
"##
}
