use std::sync::Arc;

use crate::config::Config;
use crate::episode::{EpisodeDownloader, EpisodeProcessor, HttpEpisodeDownloader, PassthroughProcessor};
use crate::feed::{AudioLinkFinder, EnclosureAudioFinder, FeedSource, HttpFeedSource};
use crate::observability::Metrics;

/// Shared, read-only state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub feeds: Arc<dyn FeedSource>,
    pub audio: Arc<dyn AudioLinkFinder>,
    pub downloader: Arc<dyn EpisodeDownloader>,
    pub processor: Arc<dyn EpisodeProcessor>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        feeds: Arc<dyn FeedSource>,
        audio: Arc<dyn AudioLinkFinder>,
        downloader: Arc<dyn EpisodeDownloader>,
        processor: Arc<dyn EpisodeProcessor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            feeds,
            audio,
            downloader,
            processor,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Wire the default HTTP-backed services from configuration.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let client = config.http.build_client()?;
        let downloader =
            HttpEpisodeDownloader::new(client.clone(), config.storage.download_dir.clone());

        Ok(Self::new(
            config,
            Arc::new(HttpFeedSource::new(client)),
            Arc::new(EnclosureAudioFinder),
            Arc::new(downloader),
            Arc::new(PassthroughProcessor),
        ))
    }
}
