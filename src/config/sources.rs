use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "PODLY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/podly.toml";
const ENV_PREFIX: &str = "PODLY";
const ENV_SEPARATOR: &str = "__";

/// Path of the TOML file: `PODLY_CONFIG` or the default location
pub fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // .env may itself set PODLY_CONFIG
    load_dotenv(None);

    load_from_sources(default_path())
}

/// Load configuration from an explicit TOML path, still honoring `.env`
pub fn load_from_path(config_path: PathBuf) -> Result<Config, ConfigError> {
    load_with_dotenv(config_path, None)
}

/// Like [`load_from_path`], reading `.env` from `dotenv_path` when given
pub fn load_with_dotenv(
    config_path: PathBuf,
    dotenv_path: Option<&Path>,
) -> Result<Config, ConfigError> {
    load_dotenv(dotenv_path);
    load_from_sources(config_path)
}

fn load_dotenv(dotenv_path: Option<&Path>) {
    let result = match dotenv_path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };

    if let Err(err) = result {
        if !err.not_found() {
            tracing::warn!(error = %err, "Failed to read .env file");
        }
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // PODLY__SERVER__PUBLIC_URL -> server.public_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
