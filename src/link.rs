//! Rewritten download links.
//!
//! A rewritten link carries two values, the tagged podcast title and the
//! original audio URL, in its query string:
//!
//! ```text
//! {base}/download/{episode}.mp3?podcast_title=...PODLYPARAMSEPepisode_url=...
//! ```
//!
//! Podcast apps re-escape `&` inconsistently when they cache feed links, so
//! the two parameters are joined with [`PARAM_SEP`] instead. Links already
//! stored by subscribers use this exact shape and must keep decoding.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Token substituted for `&` between the two query parameters.
pub const PARAM_SEP: &str = "PODLYPARAMSEP";

/// Prefix applied to rewritten feed titles and to the encoded podcast title.
pub const FEED_TAG: &str = "[podly] ";

/// Route the download links point at.
pub const DOWNLOAD_ROUTE: &str = "/download";

const PODCAST_TITLE_PARAM: &str = "podcast_title";
const EPISODE_URL_PARAM: &str = "episode_url";

static COLLAPSED_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?):/([^/])").expect("static regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("download link is missing the '{0}' parameter")]
    MissingParameter(&'static str),
}

/// Values recovered from a rewritten link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadParams {
    pub podcast_title: String,
    pub episode_url: String,
}

/// Builds and reads rewritten download links.
#[derive(Debug, Clone, Default)]
pub struct LinkCodec {
    base: Option<String>,
}

impl LinkCodec {
    /// `base` is the scheme and host links are prefixed with. Without one,
    /// links are path-relative and resolve against whichever host served
    /// the feed.
    pub fn new(base: Option<&str>) -> Self {
        Self {
            base: base
                .map(|b| b.trim_end_matches('/').to_string())
                .filter(|b| !b.is_empty()),
        }
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Build the rewritten link for one episode.
    pub fn encode(&self, podcast_title: &str, episode_title: &str, audio_url: &str) -> String {
        let tagged_title = format!("{FEED_TAG}{}", sanitize_title(podcast_title));
        let episode_file = format!("{}.mp3", sanitize_title(episode_title));

        if tagged_title.contains(PARAM_SEP) || audio_url.contains(PARAM_SEP) {
            warn!(
                podcast_title = %tagged_title,
                audio_url,
                "Download link field contains the parameter separator, link will not decode cleanly"
            );
        }

        format!(
            "{}{DOWNLOAD_ROUTE}/{}?{PODCAST_TITLE_PARAM}={}{PARAM_SEP}{EPISODE_URL_PARAM}={}",
            self.base.as_deref().unwrap_or_default(),
            urlencoding::encode(&episode_file),
            urlencoding::encode(&tagged_title),
            urlencoding::encode(audio_url),
        )
    }

    /// Recover the podcast title and audio URL from a rewritten link.
    ///
    /// Accepts a full URL, a path with query, or a bare query string.
    /// Parameters are matched like a form query: `+` is a space, the first
    /// occurrence wins and blank values count as missing.
    pub fn decode(full_url: &str) -> Result<DownloadParams, LinkError> {
        let joined = full_url.replace(PARAM_SEP, "&");
        let without_fragment = joined.split('#').next().unwrap_or_default();
        let query = match without_fragment.split_once('?') {
            Some((_, query)) => query,
            None if without_fragment.contains('=') => without_fragment,
            None => "",
        };

        let mut podcast_title = None;
        let mut episode_url = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                PODCAST_TITLE_PARAM if podcast_title.is_none() => {
                    podcast_title = Some(value.into_owned())
                }
                EPISODE_URL_PARAM if episode_url.is_none() => {
                    episode_url = Some(value.into_owned())
                }
                _ => {}
            }
        }

        Ok(DownloadParams {
            podcast_title: podcast_title
                .ok_or(LinkError::MissingParameter(PODCAST_TITLE_PARAM))?,
            episode_url: episode_url.ok_or(LinkError::MissingParameter(EPISODE_URL_PARAM))?,
        })
    }
}

/// Drop everything except ASCII letters, ASCII digits and whitespace.
///
/// Lossy: distinct titles can collapse to the same output.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Repair `http:/host` into `http://host` and default to `https://` when no
/// http scheme is present. Other malformations pass through unchanged.
pub fn fixup(url: &str) -> String {
    let repaired = COLLAPSED_SCHEME.replace_all(url, "$1://$2");
    if repaired.starts_with("http://") || repaired.starts_with("https://") {
        repaired.into_owned()
    } else {
        format!("https://{repaired}")
    }
}

/// Whether `candidate` is an absolute http(s) URL with a host.
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
