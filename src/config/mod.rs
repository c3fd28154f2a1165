//! Configuration for capture sessions
//!
//! Loads capture settings from TOML files. Only the fields the codec and the
//! capture task consume live here; transport settings (port, baud rate,
//! trigger setup) belong to the device layer and are out of scope.
//!
//! # Example
//! ```ignore
//! let config = Config::load("config.toml")?;
//! let layout = config.capture.channel_layout()?;
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::codec::{ChannelLayout, CodecError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid capture settings: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.capture.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.capture.validate()?;
        Ok(config)
    }
}

/// Capture session settings consumed by the codec
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Enabled-channel bitmask (32 channels in 4 groups of 8)
    pub enabled_channels: u32,

    /// Requested sample depth, informational for downstream consumers
    pub sample_count: u32,

    /// Whether the device compresses the stream with RLE
    ///
    /// The decoder only supports RLE streams; literal capture mode is a
    /// device-layer concern.
    #[serde(default = "default_rle_enabled")]
    pub rle_enabled: bool,

    /// Sample rate in Hz (default: 100 MHz internal clock)
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u64,

    /// Double-rate (DDR) sampling. Parsed for completeness; not supported
    /// by this decoder because the de-interleave rule is device-specific.
    #[serde(default)]
    pub double_rate: bool,

    /// Optional decode cutoff in samples; decoding stops once the cumulative
    /// timestamp reaches this value
    #[serde(default)]
    pub sample_budget: Option<u64>,
}

fn default_rle_enabled() -> bool {
    true
}

fn default_sample_rate_hz() -> u64 {
    100_000_000
}

impl CaptureConfig {
    /// Resolve the channel layout for this capture
    pub fn channel_layout(&self) -> Result<ChannelLayout, CodecError> {
        ChannelLayout::from_mask(self.enabled_channels)
    }

    /// Check settings the decoder cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_channels == 0 {
            return Err(ConfigError::Invalid(
                "enabled_channels must select at least one channel".to_string(),
            ));
        }
        if !self.rle_enabled {
            return Err(ConfigError::Invalid(
                "only RLE-compressed captures are supported".to_string(),
            ));
        }
        if self.double_rate {
            return Err(ConfigError::Invalid(
                "double-rate sampling is not supported".to_string(),
            ));
        }
        Ok(())
    }
}
