//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::EngineError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Engine failure, mapped per variant.
    Engine(EngineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                let body = serde_json::json!({ "error": message });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Engine(err) => engine_error_response(err),
        }
    }
}

fn engine_error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::SelectionRequired { .. } | EngineError::SelectionAmbiguous { .. } => {
            StatusCode::BAD_REQUEST
        }
        EngineError::OutOfStock | EngineError::InsufficientStock { .. } => StatusCode::CONFLICT,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Unauthenticated => StatusCode::UNAUTHORIZED,
        EngineError::OrderNotReady(_) => StatusCode::CONFLICT,
        EngineError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        EngineError::Store(_) => {
            tracing::error!(error = %err, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let mut body = serde_json::json!({ "error": err.to_string() });
    match &err {
        // The exact available quantity lets the client clamp instead of
        // parsing the message.
        EngineError::InsufficientStock { available } => {
            body["available"] = (*available).into();
        }
        // The provider's raw payload, for operator follow-up.
        EngineError::Upstream { payload, .. } => {
            body["detail"] = payload.clone();
        }
        _ => {}
    }
    (status, Json(body)).into_response()
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}
