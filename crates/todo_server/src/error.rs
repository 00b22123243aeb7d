use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use std::time::Duration;
use thiserror::Error;
use todo_core::RepoError;

use crate::api::ValidationError;

/// Failure of one HTTP operation. Every variant maps to an explicit status
/// and the response body is always empty.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Delete has no server-error row: a failed storage call answers 404.
    /// Validation and timeout failures keep their own status.
    pub fn for_delete(self) -> Self {
        match self {
            ApiError::Internal(message) => ApiError::NotFound(message),
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                "event=http_error module=handler status={} error={}",
                status.as_u16(),
                self
            );
        } else {
            warn!(
                "event=http_error module=handler status={} error={}",
                status.as_u16(),
                self
            );
        }
        status.into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(not_found) => ApiError::NotFound(not_found.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
