//! Configuration module.
//!
//! Handles loading, validating, and merging a `scaledown.toml` file. Stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! quality = 75                          # JPEG quality of scaled images (1-100)
//! prefix = "Scaled_"                    # File name prefix
//! timestamp_format = "%Y-%m-%d-%H-%M-%S"
//!
//! [scaling]
//! mode = "fit"                          # "fit" or "crop"
//!
//! [compress]
//! start_quality = 95                    # First re-encode quality
//! min_quality = 40                      # Lowest quality tried
//! quality_step = 10                     # Decrement per attempt
//! max_attempts = 6                      # Hard bound on attempts
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CompressSchedule, Quality, ScaleMode};
use crate::naming::{self, FileNaming};
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
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `scaledown.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    /// Encoding and naming of scaled output.
    pub output: OutputConfig,
    /// Defaults for scale requests.
    pub scaling: ScalingConfig,
    /// Re-compression schedule.
    pub compress: CompressConfig,
}

/// Encoding and naming of scaled output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
    pub prefix: String,
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            prefix: naming::DEFAULT_PREFIX.to_string(),
            timestamp_format: naming::DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl OutputConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    pub fn naming(&self) -> FileNaming {
        FileNaming {
            prefix: self.prefix.clone(),
            timestamp_format: self.timestamp_format.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    /// Mode used when the caller does not pick one.
    pub mode: ScaleMode,
}

/// Bounded re-compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub start_quality: u32,
    pub min_quality: u32,
    pub quality_step: u32,
    pub max_attempts: u32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        let schedule = CompressSchedule::default();
        Self {
            start_quality: schedule.start.value() as u32,
            min_quality: schedule.min.value() as u32,
            quality_step: schedule.step as u32,
            max_attempts: schedule.max_attempts,
        }
    }
}

impl CompressConfig {
    pub fn schedule(&self) -> CompressSchedule {
        CompressSchedule {
            start: Quality::new(self.start_quality),
            min: Quality::new(self.min_quality),
            step: self.quality_step.min(u8::MAX as u32) as u8,
            max_attempts: self.max_attempts,
        }
    }
}

fn check_quality(name: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!("{name} must be 1-100")));
    }
    Ok(())
}

impl ScaleConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quality("output.quality", self.output.quality)?;
        if self.output.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "output.prefix must not be empty".into(),
            ));
        }
        if self.output.prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.prefix must not contain path separators".into(),
            ));
        }
        if !naming::is_valid_timestamp_format(&self.output.timestamp_format) {
            return Err(ConfigError::Validation(format!(
                "output.timestamp_format '{}' is not a valid strftime format",
                self.output.timestamp_format
            )));
        }

        let c = &self.compress;
        check_quality("compress.start_quality", c.start_quality)?;
        check_quality("compress.min_quality", c.min_quality)?;
        if c.min_quality > c.start_quality {
            return Err(ConfigError::Validation(
                "compress.min_quality must not exceed compress.start_quality".into(),
            ));
        }
        if c.quality_step == 0 || c.quality_step > 99 {
            return Err(ConfigError::Validation(
                "compress.quality_step must be 1-99".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "compress.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ScaleConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ScaleConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ScaleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// `None` yields the stock defaults. `Some(path)` must name an existing TOML
/// file; its values are merged over the defaults and validated.
pub fn load_config(path: Option<&Path>) -> Result<ScaleConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = match path {
        None => None,
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `scaledown.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# scaledown configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Scaled output
# ---------------------------------------------------------------------------
[output]
# JPEG quality for scaled images (1 = worst, 100 = best).
quality = 75

# Scaled files are named <prefix><timestamp>.jpg
prefix = "Scaled_"

# chrono strftime format. One-second resolution; a numeric suffix is added
# if the name is already taken.
timestamp_format = "%Y-%m-%d-%H-%M-%S"

# ---------------------------------------------------------------------------
# Scaling
# ---------------------------------------------------------------------------
[scaling]
# "fit"  - whole image visible, may be smaller than the box on one axis
# "crop" - box filled exactly, centered crop of the excess
mode = "fit"

# ---------------------------------------------------------------------------
# Re-compression (scaledown compress)
# ---------------------------------------------------------------------------
[compress]
# Qualities tried, highest first: start, start - step, ... down to min.
start_quality = 95
min_quality = 40
quality_step = 10

# Never more than this many encode attempts per file.
max_attempts = 6
"##
}
