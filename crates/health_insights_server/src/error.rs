//! Error types for the HTTP server and CLI.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use health_insights_core::InsightError;
use thiserror::Error;

/// Server errors, rendered as `{"detail": ...}` with a matching status.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<csv::Error> for ServerError {
    fn from(err: csv::Error) -> Self {
        ServerError::BadRequest(format!("malformed CSV: {err}"))
    }
}

impl From<InsightError> for ServerError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::ShapeMismatch(_) | InsightError::EmptyDataset => {
                ServerError::BadRequest(err.to_string())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ServerError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_variants() {
        assert_eq!(
            ServerError::NotFound("Data ID not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::from(InsightError::ShapeMismatch("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn detail_is_the_bare_message() {
        let err = ServerError::NotFound("Data ID not found".into());
        assert_eq!(err.to_string(), "Data ID not found");
    }
}
