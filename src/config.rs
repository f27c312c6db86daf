//! Configuration module.
//!
//! Handles loading, validating, and merging `cropfit.toml`. User values are
//! layered over stock defaults, so the file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! path = "media"                # Root directory of the local store
//! url = "http://localhost"      # Base URL variants are served under
//!
//! [resize]
//! mode = "fill"                 # "fit" or "fill"
//! algorithm = "crop_sample_then_scale"  # Fill only: or "scale_then_crop"
//! upscale = false               # Allow output larger than the original
//! quality = 90                  # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Algorithm, Mode, Quality, ResizeConfig, ResizeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "cropfit.toml";

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

/// Configuration loaded from `cropfit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where objects are stored and served from.
    pub storage: StorageConfig,
    /// Default resize policy for commands that do not override it.
    pub resize: ResizeSettings,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.resize.quality) {
            return Err(ConfigError::Validation(
                "resize.quality must be 1-100".into(),
            ));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.path must not be empty".into(),
            ));
        }
        if !self.storage.url.contains("://") {
            return Err(ConfigError::Validation(format!(
                "storage.url must be an absolute URL, got '{}'",
                self.storage.url
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory of the local store, relative to the working directory.
    pub path: PathBuf,
    /// Base URL that variant URLs start with.
    pub url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("media"),
            url: "http://localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeSettings {
    pub mode: Mode,
    pub algorithm: Algorithm,
    pub upscale: bool,
    /// JPEG quality (1-100). Other output formats are lossless.
    pub quality: u32,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            algorithm: Algorithm::default(),
            upscale: false,
            quality: 90,
        }
    }
}

impl ResizeSettings {
    /// The default algorithm is left implicit so variant names stay short.
    pub fn options(&self) -> ResizeOptions {
        ResizeOptions {
            mode: self.mode,
            algorithm: (self.algorithm != Algorithm::default()).then_some(self.algorithm),
            upscale: self.upscale,
        }
    }

    pub fn resize_config(&self) -> ResizeConfig {
        ResizeConfig {
            options: self.options(),
            quality: Quality::new(self.quality),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

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

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an explicit file path. The file must exist.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `cropfit.toml` from `dir`, falling back to stock defaults when the
/// directory has none.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `cropfit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cropfit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Root directory of the local store. Relative paths resolve against the
# working directory.
path = "media"

# Base URL variants are served under. Variant URLs look like
#   <url>/<g1>/<g2>/<g3>/<g4>/<g5>/<original-name>/<variant-name>
url = "http://localhost"

# ---------------------------------------------------------------------------
# Resize defaults
# ---------------------------------------------------------------------------
[resize]
# "fit"  - shrink to stay inside the target box, never crop.
# "fill" - cover the whole target box, crop what overflows.
mode = "fill"

# How fill is carried out. Both produce the same framing.
#   "crop_sample_then_scale" - cut the region first, then scale it (faster)
#   "scale_then_crop"        - scale the whole image, then trim it
algorithm = "crop_sample_then_scale"

# Allow output larger than the original.
upscale = false

# JPEG quality (1 = worst, 100 = best). PNG, TIFF and WebP are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
