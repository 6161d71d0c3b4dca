use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::feed::RewriteError;

/// Errors surfaced by the legacy routes.
///
/// The message is the plain-text response body; details are logged where
/// the error is raised.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    UpstreamFailure(&'static str),
    #[error("{0}")]
    Io(&'static str),
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamFailure(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

impl From<RewriteError> for ApiError {
    fn from(value: RewriteError) -> Self {
        match value {
            RewriteError::Serialize(_) => ApiError::Internal("Failed to build feed"),
            RewriteError::FaviconProbe
            | RewriteError::InvalidUrl(_)
            | RewriteError::Upstream(_)
            | RewriteError::MissingTitle(_) => ApiError::NotFound("Not Found"),
        }
    }
}
