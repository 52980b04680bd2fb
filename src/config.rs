//! Compression configuration module.
//!
//! Handles loading, validating, and merging `jpegfit.toml` files.
//! Configuration is layered: stock defaults are overridden by each layer in
//! turn, and each layer only needs the keys it wants to change.
//!
//! ```text
//! stock defaults
//!   → <input_dir>/jpegfit.toml   (picked up automatically when present)
//!   → --config <file>            (explicit file)
//!   → CLI flags                  (--min-kb, --max-kb, --quality, --jobs)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_subdir = "compressed"  # Output directory name inside the input dir
//!
//! [sizes]
//! min_kb = 400              # Below this: re-encode at quality 95
//! max_kb = 600              # Above this: fit into max_kb (also the target)
//!
//! [jpeg]
//! initial_quality = 85      # Starting point of the quality search (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::CompressionTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name picked up from the input directory.
pub const CONFIG_FILENAME: &str = "jpegfit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compression configuration loaded from `jpegfit.toml`.
///
/// All fields have defaults matching the stock thresholds (400/600 KiB,
/// quality 85). Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Name of the output directory created inside the input directory.
    pub output_subdir: String,
    /// Size thresholds in KiB.
    pub sizes: SizesConfig,
    /// JPEG encoder settings.
    pub jpeg: JpegConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            output_subdir: "compressed".to_string(),
            sizes: SizesConfig::default(),
            jpeg: JpegConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CompressConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizes.max_kb == 0 {
            return Err(ConfigError::Validation(
                "sizes.max_kb must be greater than 0".into(),
            ));
        }
        let thresholds = [
            ("sizes.min_kb", self.sizes.min_kb),
            ("sizes.max_kb", self.sizes.max_kb),
        ];
        for (key, kb) in thresholds {
            if kb.checked_mul(1024).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{key} ({kb}) is too large to express in bytes"
                )));
            }
        }
        if self.sizes.min_kb > self.sizes.max_kb {
            return Err(ConfigError::Validation(format!(
                "sizes.min_kb ({}) must not exceed sizes.max_kb ({})",
                self.sizes.min_kb, self.sizes.max_kb
            )));
        }
        if !(1..=100).contains(&self.jpeg.initial_quality) {
            return Err(ConfigError::Validation(
                "jpeg.initial_quality must be 1-100".into(),
            ));
        }
        if self.output_subdir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_subdir must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Byte thresholds and starting quality for a batch run.
    pub fn target(&self) -> CompressionTarget {
        CompressionTarget::from_kb(
            self.sizes.min_kb,
            self.sizes.max_kb,
            self.jpeg.initial_quality,
        )
    }
}

/// Size thresholds, in KiB (1 KiB = 1024 bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizesConfig {
    pub min_kb: u64,
    /// Upper bound of the normal range and the budget for larger files.
    pub max_kb: u64,
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            min_kb: 400,
            max_kb: 600,
        }
    }
}

/// JPEG encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    pub initial_quality: u32,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            initial_quality: 85,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
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

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub min_kb: Option<u64>,
    pub max_kb: Option<u64>,
    pub initial_quality: Option<u32>,
    pub max_processes: Option<usize>,
}

impl CliOverrides {
    /// The overrides as a sparse TOML table, ready for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::Table::new();
        let mut sizes = toml::Table::new();
        if let Some(v) = self.min_kb {
            sizes.insert("min_kb".into(), toml::Value::Integer(v as i64));
        }
        if let Some(v) = self.max_kb {
            sizes.insert("max_kb".into(), toml::Value::Integer(v as i64));
        }
        if !sizes.is_empty() {
            root.insert("sizes".into(), toml::Value::Table(sizes));
        }
        if let Some(v) = self.initial_quality {
            let mut jpeg = toml::Table::new();
            jpeg.insert("initial_quality".into(), toml::Value::Integer(v as i64));
            root.insert("jpeg".into(), toml::Value::Table(jpeg));
        }
        if let Some(v) = self.max_processes {
            let mut processing = toml::Table::new();
            processing.insert("max_processes".into(), toml::Value::Integer(v as i64));
            root.insert("processing".into(), toml::Value::Table(processing));
        }
        toml::Value::Table(root)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CompressConfig::default()).expect("default config must serialize")
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

/// Load a TOML file as a raw value.
pub fn load_raw_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `jpegfit.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `jpegfit.toml`.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_file(&config_path).map(Some)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<CompressConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: CompressConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full configuration for a run.
///
/// Layers, lowest first: stock defaults, `jpegfit.toml` in `input_dir` (if
/// any), the explicit `config_file` (if any), then the CLI overrides.
pub fn load_config(
    input_dir: Option<&Path>,
    config_file: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<CompressConfig, ConfigError> {
    let mut overlays = Vec::new();
    if let Some(dir) = input_dir {
        overlays.extend(load_raw_config(dir)?);
    }
    if let Some(file) = config_file {
        overlays.push(load_raw_file(file)?);
    }
    overlays.push(overrides.to_toml());
    resolve_config(stock_defaults_value(), overlays)
}

/// Returns a fully-commented stock `jpegfit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# jpegfit Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Layers, lowest first:
#   stock defaults
#   <input_dir>/jpegfit.toml   (picked up automatically)
#   --config <file>
#   command-line flags
#
# Each layer only needs the keys it wants to override.
# Unknown keys will cause an error.

# Output directory name, created inside the input directory
# when --output is not given.
output_subdir = "compressed"

# ---------------------------------------------------------------------------
# Size thresholds (KiB, 1 KiB = 1024 bytes)
# ---------------------------------------------------------------------------
[sizes]
# Files smaller than this are re-encoded as quality-95 JPEG.
min_kb = 400

# Files up to this size are re-encoded as quality-95 JPEG too.
# Larger files are scaled and compressed until they fit in max_kb.
max_kb = 600

# ---------------------------------------------------------------------------
# JPEG encoding
# ---------------------------------------------------------------------------
[jpeg]
# First quality tried when fitting a large file (1-100).
# The search steps down by 5 while quality stays above 10.
initial_quality = 85

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
