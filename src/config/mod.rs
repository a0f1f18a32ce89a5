//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::scroll::ObserverOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_collection() -> String {
    "stores".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_loading_delay_ms() -> u64 {
    1000
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_visibility_threshold() -> f64 {
    0.5
}

fn default_root_margin_px() -> f64 {
    100.0
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    256
}

/// Settings of a listing session
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
///
/// ```yaml
/// base_url: http://localhost:3001
/// collection: stores
/// page_size: 20
/// loading_delay_ms: 1000
/// settle_delay_ms: 100
/// visibility_threshold: 0.5
/// root_margin_px: 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Root of the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the store collection under `base_url`
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Stores per page; a shorter page ends the listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Minimum wait before each page request
    #[serde(default = "default_loading_delay_ms")]
    pub loading_delay_ms: u64,

    /// Wait between a sentinel becoming visible and the advance
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Fraction of the sentinel that must be visible
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,

    /// Pixels the viewport is grown by when testing visibility
    #[serde(default = "default_root_margin_px")]
    pub root_margin_px: f64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Buffer of the listing event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ListingConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults matching the reference collection server
    pub fn default_config() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            page_size: default_page_size(),
            loading_delay_ms: default_loading_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            visibility_threshold: default_visibility_threshold(),
            root_margin_px: default_root_margin_px(),
            request_timeout_ms: default_request_timeout_ms(),
            event_capacity: default_event_capacity(),
        }
    }

    /// Defaults with every artificial delay removed
    pub fn for_tests() -> Self {
        Self {
            loading_delay_ms: 0,
            settle_delay_ms: 0,
            ..Self::default_config()
        }
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                value: self.page_size.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "visibility_threshold".to_string(),
                value: self.visibility_threshold.to_string(),
                message: "must be in (0, 1]".to_string(),
            });
        }
        if self.root_margin_px < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "root_margin_px".to_string(),
                value: self.root_margin_px.to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                message: "must be an http(s) url".to_string(),
            });
        }
        Ok(())
    }

    /// Full URL of the store collection
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.collection.trim_start_matches('/')
        )
    }

    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.visibility_threshold,
            root_margin_px: self.root_margin_px,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListingConfig::default_config();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.loading_delay(), Duration::from_secs(1));
        assert_eq!(config.collection_url(), "http://localhost:3001/stores");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = ListingConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ListingConfig::default_config());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
base_url: https://api.example.com/
collection: /v2/stores
page_size: 50
loading_delay_ms: 0
"#;
        let config = ListingConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.page_size, 50);
        assert!(config.loading_delay().is_zero());
        assert_eq!(config.collection_url(), "https://api.example.com/v2/stores");
    }

    #[test]
    fn test_yaml_serialization() {
        let config = ListingConfig::for_tests();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = ListingConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ListingConfig::from_yaml_str("page_size: 0").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_INVALID_VALUE");

        let err = ListingConfig::from_yaml_str("visibility_threshold: 1.5").unwrap_err();
        assert!(err.to_string().contains("visibility_threshold"));

        let err = ListingConfig::from_yaml_str("base_url: ftp://x").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("listing.yaml");
        std::fs::write(&path, "page_size: 12\nsettle_delay_ms: 0\n").unwrap();

        let config = ListingConfig::from_yaml_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.observer_options().settle_delay, Duration::ZERO);
        assert_eq!(config.loading_delay_ms, 1000);
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "page_size: [not, a, number]\n").unwrap();

        let path = path.to_str().unwrap();
        let err = ListingConfig::from_yaml_file(path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_PARSE_ERROR");
        assert!(err.to_string().contains(path));
    }

    #[test]
    fn test_missing_file() {
        let err = ListingConfig::from_yaml_file("/nonexistent/feed.yaml").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_IO_ERROR");
    }

    #[test]
    fn test_observer_options() {
        let options = ListingConfig::default_config().observer_options();
        assert_eq!(options, ObserverOptions::default());
    }
}
