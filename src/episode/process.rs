use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("downloaded file {0} is missing")]
    MissingInput(PathBuf),

    #[error("processing failed: {0}")]
    Failed(String),
}

/// Work handed to the processing service for one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeTask {
    pub podcast_title: String,
    pub download_path: PathBuf,
    pub episode_name: String,
}

impl EpisodeTask {
    pub fn new(
        podcast_title: impl Into<String>,
        download_path: PathBuf,
        episode_name: impl Into<String>,
    ) -> Self {
        Self {
            podcast_title: podcast_title.into(),
            download_path,
            episode_name: episode_name.into(),
        }
    }
}

/// Turns a downloaded episode into the file served to the subscriber.
#[async_trait]
pub trait EpisodeProcessor: Send + Sync {
    async fn process(&self, task: EpisodeTask) -> Result<PathBuf, ProcessError>;
}

/// Serves the downloaded file as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughProcessor;

#[async_trait]
impl EpisodeProcessor for PassthroughProcessor {
    async fn process(&self, task: EpisodeTask) -> Result<PathBuf, ProcessError> {
        match tokio::fs::metadata(&task.download_path).await {
            Ok(meta) if meta.is_file() => {
                debug!(
                    podcast = %task.podcast_title,
                    episode = %task.episode_name,
                    path = %task.download_path.display(),
                    "Passing episode through unprocessed"
                );
                Ok(task.download_path)
            }
            _ => Err(ProcessError::MissingInput(task.download_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn passthrough_returns_download_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ep.mp3");
        std::fs::write(&path, b"audio").unwrap();

        let task = EpisodeTask::new("[podly] Pod", path.clone(), "ep.mp3");
        assert_eq!(PassthroughProcessor.process(task).await.unwrap(), path);
    }

    #[tokio::test]
    async fn passthrough_fails_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let task = EpisodeTask::new("Pod", temp_dir.path().join("gone.mp3"), "gone.mp3");

        assert!(matches!(
            PassthroughProcessor.process(task).await,
            Err(ProcessError::MissingInput(_))
        ));
    }
}
