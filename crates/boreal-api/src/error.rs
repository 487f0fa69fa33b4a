//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// API-level error, mapped onto an HTTP status plus a JSON body of the form
/// `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Database(boreal_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Well-formed request with semantically invalid content.
    Validation(String),
    /// Device is administratively suspended. Distinct from Unauthorized so a
    /// device can tell "my credential is fine, but I'm blocked" apart from
    /// "my credential is bad".
    Suspended(String),
}

impl From<boreal_core::Error> for ApiError {
    fn from(err: boreal_core::Error) -> Self {
        match err {
            boreal_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            boreal_core::Error::DeviceNotFound(id) => {
                ApiError::NotFound(format!("Device {} not found", id))
            }
            boreal_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            boreal_core::Error::Forbidden(msg) => ApiError::Forbidden(msg),
            boreal_core::Error::Conflict(msg) => ApiError::Conflict(msg),
            boreal_core::Error::InvalidInput(msg) => ApiError::Validation(msg),
            boreal_core::Error::Suspended(msg) => ApiError::Suspended(msg),
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Suspended(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
