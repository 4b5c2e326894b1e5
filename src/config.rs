//! Configuration management for authtap
//!
//! Controls which header is captured, which request kinds are observed, and
//! the key names used inside session storage. Defaults match the behavior a
//! host expects with no config file present.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::ResourceType;
use crate::security::DEFAULT_SALT_KEY;
use crate::storage::DEFAULT_RECORD_PREFIX;

/// Errors that can occur while reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Header to capture, matched case-insensitively
    pub header_name: String,
    /// Request kinds the interceptor looks at
    pub resource_types: Vec<ResourceType>,
    /// Session-storage key prefix for per-tab records
    pub record_prefix: String,
    /// Session-storage key holding the base64 salt
    pub salt_key: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            header_name: "Authorization".to_string(),
            resource_types: vec![ResourceType::XmlHttpRequest],
            record_prefix: DEFAULT_RECORD_PREFIX.to_string(),
            salt_key: DEFAULT_SALT_KEY.to_string(),
        }
    }
}

impl CaptureConfig {
    /// Gets the config directory path
    fn config_dir() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("authtap"))
    }

    /// Gets the default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Loads configuration from the default location
    ///
    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Loads configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check if a request kind is captured
    pub fn captures(&self, resource_type: ResourceType) -> bool {
        self.resource_types.contains(&resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.header_name, "Authorization");
        assert_eq!(config.record_prefix, "h_");
        assert_eq!(config.salt_key, "sessionSalt");
        assert!(config.captures(ResourceType::XmlHttpRequest));
        assert!(!config.captures(ResourceType::MainFrame));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{ "headerName": "X-Api-Key" }"#).unwrap();
        assert_eq!(config.header_name, "X-Api-Key");
        assert_eq!(config.resource_types, vec![ResourceType::XmlHttpRequest]);
        assert_eq!(config.salt_key, "sessionSalt");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = CaptureConfig {
            resource_types: vec![ResourceType::XmlHttpRequest, ResourceType::Websocket],
            ..CaptureConfig::default()
        };
        config.save_to(&path).unwrap();

        let loaded = CaptureConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            CaptureConfig::load_from(&path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CaptureConfig::load_from(&dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
