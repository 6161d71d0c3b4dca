use super::models::Config;
use crate::link;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.public_url '{url}' must be an absolute http(s) URL")]
    InvalidPublicUrl { url: String },

    #[error("Podcast '{name}' has invalid feed URL '{url}'")]
    InvalidPodcastUrl { name: String, url: String },

    #[error("Podcast short name '{name}' cannot be served (contains '/' or is reserved)")]
    InvalidPodcastName { name: String },

    #[error("storage.download_dir must not be empty")]
    EmptyDownloadDir,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_podcasts(config)?;
    validate_storage(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if let Some(ref url) = config.server.public_url {
        if !link::is_valid_url(url) {
            return Err(ValidationError::InvalidPublicUrl { url: url.clone() });
        }
    }
    Ok(())
}

/// Known podcasts are served at `/<name>`, so names must be a single path
/// segment and their URLs are used without fixup.
fn validate_podcasts(config: &Config) -> Result<(), ValidationError> {
    for (name, url) in &config.podcasts {
        if name.is_empty() || name.contains('/') || name == "favicon.ico" {
            return Err(ValidationError::InvalidPodcastName { name: name.clone() });
        }

        if !link::is_valid_url(url) {
            return Err(ValidationError::InvalidPodcastUrl {
                name: name.clone(),
                url: url.clone(),
            });
        }
    }
    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.download_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadDir);
    }
    Ok(())
}
