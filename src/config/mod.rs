//! Configuration management for podly
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use podly::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PODLY__<section>__<key>`
//!
//! Examples:
//! - `PODLY__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `PODLY__SERVER__PUBLIC_URL=https://podly.example.com`
//! - `PODLY__PODCASTS__DAILY=https://feeds.example/daily.xml`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/podly.toml`.
//! This can be overridden using the `PODLY_CONFIG` environment variable.
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:5001"
//! public_url = "https://podly.example.com"
//!
//! [podcasts]
//! daily = "https://feeds.example/daily.xml"
//!
//! [storage]
//! download_dir = "data/in"
//! ```

mod models;
mod sources;
mod validation;

pub use models::{Config, HttpConfig, ServerConfig, StorageConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`PODLY__*`)
    /// 2. TOML file (default: `config/podly.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// `.env` and environment overrides still apply.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_path(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[podcasts]
mypod = "https://feed.example/rss"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.podcasts.len(), 1);
        assert_eq!(config.podcasts["mypod"], "https://feed.example/rss");
    }

    #[test]
    fn test_validation_catches_bad_podcast() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[podcasts]
broken = "ftp://feed.example/rss"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidPodcastUrl { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\nbind_addr = \"not an address\"\n").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::LoadError(_))
        ));
    }
}
