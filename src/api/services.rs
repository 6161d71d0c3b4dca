use std::path::Path as FsPath;

use axum::{
    Json,
    body::Body,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use super::{
    error::ApiError,
    models::HealthResponse,
    state::AppState,
    utils::{content_type_for, link_base, unescape},
};
use crate::episode::EpisodeTask;
use crate::feed::{FeedRewriter, RewriteError, resolve_identifier};
use crate::link::{self, LinkCodec};

/// Rewritten feed endpoint (GET /{podcast_rss})
///
/// The path is either a known podcast short name or an upstream feed URL,
/// possibly with its `//` collapsed by the client. Every episode with a
/// playable audio link is re-pointed at `/download/...` on this service.
pub async fn rss_feed(
    State(state): State<AppState>,
    Path(podcast_rss): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let result = rewrite_feed(&state, &podcast_rss, &headers).await;
    match &result {
        Ok(_) => state.metrics.feed_served(),
        Err(_) => state.metrics.feed_rejected(),
    }
    result
}

async fn rewrite_feed(
    state: &AppState,
    podcast_rss: &str,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    info!(identifier = %podcast_rss, "Getting RSS feed");

    let url = resolve_identifier(podcast_rss, &state.config.podcasts).map_err(|err| {
        if matches!(err, RewriteError::FaviconProbe) {
            debug!("Ignoring favicon probe");
        } else {
            warn!(identifier = %podcast_rss, error = %err, "Rejecting feed identifier");
        }
        ApiError::from(err)
    })?;

    let codec = LinkCodec::new(link_base(&state.config, headers).as_deref());
    let rewriter = FeedRewriter::new(state.feeds.as_ref(), state.audio.as_ref(), codec);

    let xml = rewriter.fetch_and_rewrite(&url).await.map_err(|err| {
        warn!(%url, error = %err, "Failed to rewrite feed");
        ApiError::from(err)
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        xml,
    )
        .into_response())
}

/// Episode download endpoint (GET /download/{episode_name})
///
/// Decodes the podcast title and original audio URL from the rewritten
/// link, downloads and processes the episode, then streams the result.
/// Each stage is attempted once; the first failure ends the request.
pub async fn download_episode(
    State(state): State<AppState>,
    Path(episode_name): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let result = trigger_download(&state, &episode_name, &uri.to_string()).await;
    match &result {
        Ok(_) => state.metrics.episode_served(),
        Err(_) => state.metrics.episode_failed(),
    }
    result
}

async fn trigger_download(
    state: &AppState,
    episode_name: &str,
    full_request_url: &str,
) -> Result<Response, ApiError> {
    let episode_name = unescape(episode_name);

    let params = LinkCodec::decode(full_request_url).map_err(|err| {
        warn!(episode = %episode_name, error = %err, "Malformed download link");
        ApiError::InvalidInput("Invalid episode URL")
    })?;

    info!(
        episode = %episode_name,
        podcast = %params.podcast_title,
        "Downloading episode"
    );

    if !link::is_valid_url(&params.episode_url) {
        warn!(episode_url = %params.episode_url, "Invalid episode URL");
        return Err(ApiError::InvalidInput("Invalid episode URL"));
    }

    let episode_url = link::fixup(&params.episode_url);
    let download_path = state
        .downloader
        .download(&params.podcast_title, &episode_name, &episode_url)
        .await
        .map_err(|err| {
            error!(%episode_url, error = %err, "Failed to download episode");
            ApiError::UpstreamFailure("Failed to download episode")
        })?;

    let task = EpisodeTask::new(params.podcast_title, download_path, episode_name);
    let output_path = state.processor.process(task).await.map_err(|err| {
        error!(error = %err, "Failed to process episode");
        ApiError::UpstreamFailure("Failed to process episode")
    })?;

    send_file(&output_path).await.map_err(|err| {
        error!(path = %output_path.display(), error = %err, "Error sending file");
        ApiError::Io("Error sending file")
    })
}

async fn send_file(path: &FsPath) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(path).as_ref())
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(std::io::Error::other)
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        known_podcasts: state.config.podcasts.len(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
