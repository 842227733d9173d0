//! Error handlers
//!
//! Maps enrollment errors to HTTP status codes and client-safe messages, and
//! logs the full detail server-side.

use axum::http::StatusCode;
use log::{error, info};

use crate::error::types::EnrollError;

/// Generic message returned for every internal failure.
pub const INTERNAL_MESSAGE: &str = "internal error";

/// Log an enrollment error with the detail the client never sees
pub fn handle_error(err: &EnrollError) {
    match err {
        EnrollError::InvalidInput(reason) => info!("Rejected enrollment: {}", reason),
        EnrollError::UsernameTaken(username) => {
            info!("Rejected enrollment for {}: username taken", username)
        }
        EnrollError::Internal(inner) => error!("Enrollment failed: {}", inner),
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &EnrollError) -> StatusCode {
    match err {
        EnrollError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EnrollError::UsernameTaken(_) => StatusCode::CONFLICT,
        EnrollError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to echo back to the client.
///
/// Validation reasons are produced by this crate and never contain the
/// password; internal causes may carry paths or OS errors and are replaced.
pub fn client_message(err: &EnrollError) -> String {
    match err {
        EnrollError::InvalidInput(reason) => reason.clone(),
        EnrollError::UsernameTaken(_) => "username already taken".to_string(),
        EnrollError::Internal(_) => INTERNAL_MESSAGE.to_string(),
    }
}
