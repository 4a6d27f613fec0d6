//! Tool configuration.
//!
//! Handles loading, validating, and merging a TOML config file. The stock
//! defaults are serialized to a TOML table and the user file is merged on
//! top, so a config file only needs the keys it wants to change. Command-line
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! # quality = 90          # JPEG quality; BMP scale factor when set
//! policy = "replace"      # replace | thumbnail | timestamp
//! # format = "jpeg"       # force an output format
//!
//! [resize]
//! filter = "lanczos3"     # nearest | triangle | catmull-rom | gaussian | lanczos3
//! preserve_ratio = false
//!
//! [blur]
//! sigma = 0.0             # 0 disables blurring
//!
//! [metadata]
//! keep_exif = true        # carry EXIF from JPEG sources into JPEG outputs
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ResizeFilter};
use crate::naming::SavePolicy;
use crate::types::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Encoder and naming settings.
    pub output: OutputConfig,
    /// Resampling settings.
    pub resize: ResizeConfig,
    /// Blur applied before encoding.
    pub blur: BlurConfig,
    /// EXIF handling.
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Unset means the per-format default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    pub policy: SavePolicy,
    /// Unset means the output path's extension decides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
    pub preserve_ratio: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurConfig {
    pub sigma: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub keep_exif: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { keep_exif: true }
    }
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(q) = self.output.quality.filter(|&q| Quality::try_new(q).is_none()) {
            return Err(ConfigError::Validation(format!(
                "output.quality must be {}-{}, got {q}",
                Quality::MIN,
                Quality::MAX
            )));
        }
        if !self.blur.sigma.is_finite() || self.blur.sigma < 0.0 {
            return Err(ConfigError::Validation(
                "blur.sigma must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`, or the stock defaults when `path` is `None`.
///
/// A path that was given but does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# nano-image configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags win over this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best). Unset means 90.
# For BMP output a quality scales the image down to quality% per axis;
# BMP is only scaled when a quality is set.
# quality = 90

# What to do when the output file already exists:
#   replace   - overwrite it
#   thumbnail - keep it, write name-WxH.ext using the requested resize
#   timestamp - keep it, write name-<unix seconds>.ext
policy = "replace"

# Force an output format (jpeg, png, gif, webp, bmp) regardless of the
# output file's extension.
# format = "jpeg"

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Resampling filter: nearest, triangle, catmull-rom, gaussian, lanczos3
filter = "lanczos3"

# Fit the requested width/height to the source aspect ratio.
preserve_ratio = false

# ---------------------------------------------------------------------------
# Blur
# ---------------------------------------------------------------------------
[blur]
# Gaussian blur sigma in pixels. 0 disables blurring.
sigma = 0.0

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Carry EXIF from JPEG sources into JPEG outputs.
keep_exif = true
"##
}
