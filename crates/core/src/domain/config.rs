//! Configuration for the wrapper
//!
//! This module provides:
//! - Configuration structs for the routing and browsing sessions
//! - TOML serialization with a platform default path
//! - Validation of the fixed wrapper-identity arguments

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for routing device sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Wrapper-identity string passed as `argv[0]` to the native open call
    #[serde(default = "default_routing_wrapper")]
    pub wrapper_name: String,

    /// Capacity of the step-notification channel (lossy beyond this)
    #[serde(default = "default_step_capacity")]
    pub step_channel_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            wrapper_name: default_routing_wrapper(),
            step_channel_capacity: default_step_capacity(),
        }
    }
}

/// Settings for network browsing sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsingConfig {
    /// Wrapper-identity string passed as `argv[0]` to the native open call
    #[serde(default = "default_browsing_wrapper")]
    pub wrapper_name: String,

    /// Pass `-conmon` so the browse also covers conmon-capable devices
    #[serde(default = "default_true")]
    pub conmon: bool,

    /// Capacity of the step-notification channel (lossy beyond this)
    #[serde(default = "default_step_capacity")]
    pub step_channel_capacity: usize,
}

impl Default for BrowsingConfig {
    fn default() -> Self {
        Self {
            wrapper_name: default_browsing_wrapper(),
            conmon: true,
            step_channel_capacity: default_step_capacity(),
        }
    }
}

fn default_routing_wrapper() -> String {
    "DanteRoutingWrapper".to_string()
}

fn default_browsing_wrapper() -> String {
    "DanteBrowsingWrapper".to_string()
}

fn default_step_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

/// Top-level wrapper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub browsing: BrowsingConfig,
}

impl LinkConfig {
    /// Default configuration file location (`<config dir>/dantelink/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dantelink").join("config.toml"))
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as TOML, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Check invariants the sessions rely on
    pub fn validate(&self) -> Result<()> {
        if self.routing.wrapper_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "routing.wrapper_name must not be blank".to_string(),
            ));
        }
        if self.browsing.wrapper_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "browsing.wrapper_name must not be blank".to_string(),
            ));
        }
        if self.routing.step_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "routing.step_channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.browsing.step_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "browsing.step_channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.routing.wrapper_name, "DanteRoutingWrapper");
        assert_eq!(config.browsing.wrapper_name, "DanteBrowsingWrapper");
        assert!(config.browsing.conmon);
        assert_eq!(config.routing.step_channel_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = LinkConfig::default();
        config.routing.step_channel_capacity = 8;
        config.browsing.conmon = false;

        config.save(&path).unwrap();
        let loaded = LinkConfig::load(&path).unwrap();

        assert_eq!(loaded.routing.step_channel_capacity, 8);
        assert!(!loaded.browsing.conmon);
        assert_eq!(loaded.routing.wrapper_name, "DanteRoutingWrapper");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[routing]\nstep_channel_capacity = 2\n").unwrap();

        let loaded = LinkConfig::load(&path).unwrap();
        assert_eq!(loaded.routing.step_channel_capacity, 2);
        assert_eq!(loaded.routing.wrapper_name, "DanteRoutingWrapper");
        assert!(loaded.browsing.conmon);
    }

    #[test]
    fn test_blank_wrapper_name_rejected() {
        let mut config = LinkConfig::default();
        config.routing.wrapper_name = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = LinkConfig::default();
        config.browsing.step_channel_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
