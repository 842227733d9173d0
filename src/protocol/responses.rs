//! HTTP response bodies
//!
//! Every body is JSON. None of them carries salt, hash or password.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body of `201 Created`
#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub username: String,
    pub status: &'static str,
}

impl EnrollResponse {
    pub fn enrolled(username: String) -> Self {
        Self {
            username,
            status: "enrolled",
        }
    }
}

/// Body of every 4xx/5xx answer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub users: usize,
}

/// Build a JSON error response
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}
