//! Configuration management for checkin.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "checkin";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "checkin.db";

/// Storage key the attendee list lives under.
pub const DEFAULT_STORAGE_KEY: &str = "attendees";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CHECKIN_`, sections split by `__`,
///    e.g. `CHECKIN_STORAGE__QUOTA_BYTES`)
/// 2. TOML config file at `~/.config/checkin/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Signature capture configuration.
    pub capture: CaptureConfig,
    /// Report configuration.
    pub report: ReportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/checkin/checkin.db`
    pub database_path: Option<PathBuf>,
    /// Item key holding the serialized attendee list.
    pub key: String,
    /// Largest value the item store accepts, in bytes.
    /// Set to 0 for unlimited.
    pub quota_bytes: usize,
}

/// Signature pad configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pad width in pixels.
    pub width: u32,
    /// Pad height in pixels.
    pub height: u32,
    /// Stroke width in pixels.
    pub pen_width: f32,
    /// Stroke color as `#rrggbb`.
    pub pen_color: String,
}

/// Report-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the attendance sheet is written to.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Minimum body row height in millimetres (0 keeps text-driven heights).
    pub min_row_height: f32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: 0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 200,
            pen_width: 2.5,
            pen_color: "#000000".to_string(),
        }
    }
}

impl CaptureConfig {
    /// Pen color as RGB.
    ///
    /// Falls back to black for a color `validate` would reject.
    #[must_use]
    pub fn pen_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.pen_color).unwrap_or([0, 0, 0])
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CHECKIN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage key must not be empty".to_string(),
            });
        }

        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "signature pad must have non-zero dimensions (got {}x{})",
                    self.capture.width, self.capture.height
                ),
            });
        }

        if self.capture.pen_width.is_nan() || self.capture.pen_width <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "pen_width must be greater than 0 (got {})",
                    self.capture.pen_width
                ),
            });
        }

        if parse_hex_color(&self.capture.pen_color).is_none() {
            return Err(Error::ConfigValidation {
                message: format!("invalid pen_color: {}", self.capture.pen_color),
            });
        }

        if self.report.min_row_height.is_nan() || self.report.min_row_height < 0.0 {
            return Err(Error::ConfigValidation {
                message: "min_row_height cannot be negative".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the report output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.report
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the storage quota, `None` when unlimited.
    #[must_use]
    pub fn quota(&self) -> Option<usize> {
        (self.storage.quota_bytes > 0).then_some(self.storage.quota_bytes)
    }
}

/// Parse a `#rrggbb` color string.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
