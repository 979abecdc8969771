//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use persona_types::error::{EngineError, UpstreamService};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Engine(EngineError),
    /// Request body could not be parsed.
    Validation(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

fn upstream_message(service: UpstreamService, retryable: bool) -> String {
    if retryable {
        format!("{service} temporarily unavailable, try again later")
    } else {
        format!("{service} request failed")
    }
}

impl AppError {
    /// Status, error code and caller-facing message.
    ///
    /// Upstream detail stays in the logs; callers only learn which
    /// collaborator failed.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Engine(e) => match e {
                EngineError::AgentNotFound(_) => {
                    (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", e.to_string())
                }
                EngineError::JobNotFound(_) => {
                    (StatusCode::NOT_FOUND, "JOB_NOT_FOUND", e.to_string())
                }
                EngineError::AgentConflict(_) => {
                    (StatusCode::CONFLICT, "AGENT_CONFLICT", e.to_string())
                }
                EngineError::InvalidInput(msg) | EngineError::InvalidTrainingRequest(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                EngineError::Upstream {
                    service, retryable, ..
                } => {
                    let status = if *retryable {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR
                    };
                    (status, "UPSTREAM_FAILURE", upstream_message(*service, *retryable))
                }
                EngineError::InternalInconsistency(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            if let AppError::Engine(e) = &self {
                error!(error = %e, code, "request failed");
            }
        }
        (status, Json(ApiResponse::error(code, &message))).into_response()
    }
}
