//! Store Assistant Server
//!
//! HTTP endpoints for text and voice questions, spoken answer retrieval and
//! direct catalog lookups.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod retention;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::auth_middleware;
pub use http::create_router;
pub use metrics::{init_metrics, record_answer, record_failure, record_request};
pub use retention::spawn_sweeper;
pub use state::{AppState, CatalogHandle};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use store_assistant_agent::PipelineFailure;
use store_assistant_core::{ErrorKind, PipelineStage};
use store_assistant_pipeline::wav::is_unsupported_format;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Pipeline(#[from] PipelineFailure),

    #[error("{0}")]
    Core(#[from] store_assistant_core::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<store_assistant_persistence::PersistenceError> for ServerError {
    fn from(err: store_assistant_persistence::PersistenceError) -> Self {
        ServerError::Persistence(err.to_string())
    }
}

/// HTTP status for a pipeline error kind
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InputValidation => StatusCode::BAD_REQUEST,
        ErrorKind::Transcription => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Generation | ErrorKind::Synthesis => StatusCode::BAD_GATEWAY,
        ErrorKind::ArtifactWrite => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(failure) if is_unsupported_format(&failure.error) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServerError::Pipeline(failure) => status_for_kind(failure.kind()),
            ServerError::Core(err) if is_unsupported_format(err) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::Core(err) => status_for_kind(err.kind()),
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ServerError::Pipeline(failure) => failure.kind().as_str(),
            ServerError::Core(err) => err.kind().as_str(),
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::PayloadTooLarge(_) => "payload_too_large",
            ServerError::Persistence(_) => "persistence",
            ServerError::Internal(_) => "internal",
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    stage: Option<PipelineStage>,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_answer: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = self.label();

        let body = match self {
            ServerError::Pipeline(failure) => {
                record_failure(label, Some(failure.stage));
                ErrorBody {
                    error: label,
                    stage: Some(failure.stage),
                    detail: failure.error.reason().to_string(),
                    fallback_answer: failure.fallback_answer,
                }
            }
            ServerError::Core(err) => {
                record_failure(label, None);
                ErrorBody {
                    error: label,
                    stage: None,
                    detail: err.reason().to_string(),
                    fallback_answer: None,
                }
            }
            other => {
                record_failure(label, None);
                if other.status().is_server_error() {
                    tracing::error!(error = %other, "Request failed");
                }
                ErrorBody {
                    error: label,
                    stage: None,
                    detail: other.to_string(),
                    fallback_answer: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
