//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ports::PortError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// The mapping follows the saga's taxonomy: business rejections become
/// 4xx, remote failures 503, and inconsistencies 500 with the orphaned
/// identifiers in the body. The caller always receives a terminal
/// outcome; there is no "pending" response.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Saga execution error.
    Saga(SagaError),
    /// A read-through backend call failed.
    Port(PortError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, &msg),
            ApiError::Port(err) => {
                tracing::error!(error = %err, "backend call failed");
                error_body(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
            }
            ApiError::Saga(err) => saga_error_to_response(err),
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

fn saga_error_to_response(err: SagaError) -> Response {
    match &err {
        SagaError::CarNotFound(_) | SagaError::RentalNotFound(_) => {
            error_body(StatusCode::NOT_FOUND, &err.to_string())
        }
        SagaError::CarUnavailable(_) => error_body(StatusCode::CONFLICT, &err.to_string()),
        SagaError::RentalForbidden(_) => error_body(StatusCode::FORBIDDEN, &err.to_string()),
        SagaError::InvalidPeriod { .. } => error_body(StatusCode::BAD_REQUEST, &err.to_string()),
        SagaError::Remote(_) | SagaError::MissingOnUpdate { .. } | SagaError::Aborted(_) => {
            tracing::error!(error = %err, "saga aborted on a backend failure");
            error_body(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        SagaError::Inconsistent(report) => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "orphans": report,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
        }
        SagaError::CleanupIncomplete { remaining, .. } => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "remaining": remaining,
                "retryable": true,
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(body)).into_response()
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Port(err)
    }
}
