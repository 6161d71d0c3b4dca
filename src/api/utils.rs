//! API utility functions
//!
//! Pure, stateless helpers for request and response handling.

use std::path::Path;

use axum::http::{HeaderMap, header};

use crate::config::Config;

/// Scheme and host the request reached us on, e.g. `http://localhost:5001`.
///
/// Honors `X-Forwarded-Proto` from a fronting proxy; defaults to `http`.
pub fn request_root(headers: &HeaderMap) -> Option<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    let scheme = headers
        .get("X-Forwarded-Proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| matches!(*v, "http" | "https"))
        .unwrap_or("http");

    Some(format!("{scheme}://{host}"))
}

/// Base URL for rewritten links: the configured public URL, else the
/// request's own root. `None` yields path-relative links.
pub fn link_base(config: &Config, headers: &HeaderMap) -> Option<String> {
    config
        .server
        .public_url
        .clone()
        .or_else(|| request_root(headers))
}

/// Percent-decode a path segment, keeping the raw text if it is not valid UTF-8.
pub fn unescape(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Content type for a served episode file.
pub fn content_type_for(path: &Path) -> mime::Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let audio = match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        _ => return mime::APPLICATION_OCTET_STREAM,
    };

    audio.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
