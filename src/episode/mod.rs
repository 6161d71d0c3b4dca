//! Episode download and processing services consumed by the download route.

mod download;
mod process;

pub use download::{DownloadError, EpisodeDownloader, HttpEpisodeDownloader};
pub use process::{EpisodeProcessor, EpisodeTask, PassthroughProcessor, ProcessError};
