use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fetches an episode's audio to local disk.
#[async_trait]
pub trait EpisodeDownloader: Send + Sync {
    async fn download(
        &self,
        podcast_title: &str,
        episode_name: &str,
        url: &str,
    ) -> Result<PathBuf, DownloadError>;
}

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Streams episodes into `{download_dir}/{podcast}/{episode}`.
///
/// Bodies land in a sibling `.partial` file first and are renamed into
/// place once complete, so the final path only ever holds whole episodes.
#[derive(Clone)]
pub struct HttpEpisodeDownloader {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl HttpEpisodeDownloader {
    pub fn new(client: reqwest::Client, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    /// Local path an episode is stored at.
    pub fn episode_path(&self, podcast_title: &str, episode_name: &str) -> PathBuf {
        self.download_dir
            .join(safe_component(podcast_title, "podcast"))
            .join(safe_component(episode_name, "episode.mp3"))
    }

    async fn stream_to(&self, url: &str, output_path: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::HttpFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_err = |source| DownloadError::Io {
            path: output_path.to_path_buf(),
            source,
        };

        let mut file = File::create(output_path).await.map_err(io_err)?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| DownloadError::StreamFailed {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

#[async_trait]
impl EpisodeDownloader for HttpEpisodeDownloader {
    async fn download(
        &self,
        podcast_title: &str,
        episode_name: &str,
        url: &str,
    ) -> Result<PathBuf, DownloadError> {
        let output_path = self.episode_path(podcast_title, episode_name);

        if let Ok(meta) = tokio::fs::metadata(&output_path).await {
            if meta.is_file() && meta.len() > 0 {
                debug!(path = %output_path.display(), "Episode already downloaded");
                return Ok(output_path);
            }
        }

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let partial_path = partial_path_for(&output_path);
        let result = match self.stream_to(url, &partial_path).await {
            Ok(bytes) => tokio::fs::rename(&partial_path, &output_path)
                .await
                .map(|()| bytes)
                .map_err(|source| DownloadError::Io {
                    path: output_path.clone(),
                    source,
                }),
            Err(err) => Err(err),
        };

        match result {
            Ok(bytes) => {
                info!(url, bytes, path = %output_path.display(), "Episode downloaded");
                Ok(output_path)
            }
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial_path.display(), error = %cleanup, "Failed to remove partial download");
                    }
                }
                Err(err)
            }
        }
    }
}

/// `{episode}.{pid}-{seq}.partial`, unique per in-flight download.
fn partial_path_for(output_path: &Path) -> PathBuf {
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = output_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!(".{}-{}.partial", std::process::id(), seq));
    output_path.with_file_name(name)
}

fn safe_component(name: &str, fallback: &str) -> String {
    let cleaned = sanitize_filename::sanitize(name.trim());
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        fallback.to_string()
    } else {
        cleaned
    }
}
