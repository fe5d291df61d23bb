//! # Configuration Management Module
//!
//! Persistent analyzer settings stored in platform-appropriate locations.
//! Handles loading, saving, and providing defaults for configuration options.
//!
//! ## Settings
//! - `rise_threshold`, `descend_threshold`, `stable_band`: phase machine thresholds in g
//! - `sampling_hz`: nominal sampling rate reported in the sensor block
//! - `transport_resolution`: maximum rows returned for plotting
//! - `worker_threads`, `cache_capacity`: background analysis pool sizing
//!
//! ## Storage Location
//! - macOS: ~/Library/Application Support/sts-analyzer/config.toml
//! - Linux: ~/.config/sts-analyzer/config.toml
//! - Windows: %APPDATA%\sts-analyzer\config.toml
//!
//! Every field has a default, so a file only needs the settings it changes.

use crate::error::ConfigError;
use crate::segmentation::SegmentationThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rise_threshold: f64,
    pub descend_threshold: f64,
    pub stable_band: f64,
    pub sampling_hz: f64,
    pub transport_resolution: usize,
    pub worker_threads: usize,
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let thresholds = SegmentationThresholds::default();
        Self {
            rise_threshold: thresholds.rise,
            descend_threshold: thresholds.descend,
            stable_band: thresholds.stable_band,
            sampling_hz: 60.0,
            transport_resolution: 1000,
            worker_threads: 2,
            cache_capacity: 32,
        }
    }
}

/// Sensor-block metadata supplied by configuration rather than computed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportConfig {
    pub sampling_hz: f64,
    pub resolution: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Config::default().transport()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sts-analyzer")
            .join("config.toml")
    }

    /// Load config from the default location, or create default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the default there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents)
                    .map_err(ConfigError::ParseFailed)?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File doesn't exist, create default
                let config = Self::default();
                config.save_to(path)?;
                log::info!("Wrote default config to {}", path.display());
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadFailed(e)),
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(ConfigError::WriteFailed)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml_string)
            .map_err(ConfigError::WriteFailed)?;

        Ok(())
    }

    pub fn thresholds(&self) -> SegmentationThresholds {
        SegmentationThresholds {
            rise: self.rise_threshold,
            descend: self.descend_threshold,
            stable_band: self.stable_band,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            sampling_hz: self.sampling_hz,
            resolution: self.transport_resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rise_threshold, 0.5);
        assert_eq!(config.descend_threshold, -0.3);
        assert_eq!(config.stable_band, 0.1);
        assert_eq!(config.transport_resolution, 1000);
        assert_eq!(config.thresholds(), SegmentationThresholds::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            rise_threshold: 0.6,
            worker_threads: 4,
            ..Config::default()
        };

        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        assert!(toml_str.contains("rise_threshold = 0.6"));
        assert!(toml_str.contains("worker_threads = 4"));
    }

    #[test]
    fn test_partial_config_deserialization() {
        let toml_str = r#"
            stable_band = 0.15
            transport_resolution = 250
        "#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.stable_band, 0.15);
        assert_eq!(config.transport().resolution, 250);
        assert_eq!(config.rise_threshold, 0.5);
        assert_eq!(config.cache_capacity, 32);
    }

    #[test]
    fn test_config_load_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).expect("Failed to load config");

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_config_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            descend_threshold: -0.25,
            sampling_hz: 100.0,
            ..Config::default()
        };

        config.save_to(&path).expect("Failed to save config");
        let reloaded = Config::load_from(&path).expect("Failed to reload config");

        assert_eq!(reloaded, config);
        assert_eq!(reloaded.thresholds().descend, -0.25);
    }

    #[test]
    fn test_config_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "rise_threshold = \"high\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
