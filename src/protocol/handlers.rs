//! Request handlers for the enrollment HTTP surface.
//!
//! Credentials are read from a form body only. The password never appears
//! in a URL, a log line, or a response.

use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::{Form, Json};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, info};
use serde::Deserialize;
use std::sync::Arc;

use crate::enrollment::EnrollmentService;
use crate::error::EnrollError;
use crate::error::handlers::{INTERNAL_MESSAGE, client_message, error_to_status, handle_error};
use crate::protocol::responses::{EnrollResponse, HealthResponse, error_response};

pub type SharedService = Arc<EnrollmentService>;

/// Form body of `POST /enroll`. Fields are optional so a missing one maps to
/// `400` instead of the extractor's own rejection.
#[derive(Deserialize)]
pub struct EnrollForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `POST /enroll` and `POST /`
pub async fn enroll(
    State(service): State<SharedService>,
    form: Result<Form<EnrollForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            info!("Rejected enrollment request body ({})", rejection.status());
            return error_response(
                StatusCode::BAD_REQUEST,
                "expected a form body with username and password",
            );
        }
    };

    let (Some(username), Some(password)) = (form.username, form.password) else {
        return reject(EnrollError::InvalidInput(
            "missing username or password".into(),
        ));
    };

    match service.enroll(&username, password).await {
        Ok(enrolled) => (
            StatusCode::CREATED,
            Json(EnrollResponse::enrolled(enrolled.username)),
        )
            .into_response(),
        Err(err) => reject(err),
    }
}

/// `GET /health`
pub async fn health(State(service): State<SharedService>) -> Response {
    match service.enrolled_count().await {
        Ok(users) => Json(HealthResponse {
            status: "ok",
            users,
        })
        .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
        }
    }
}

fn reject(err: EnrollError) -> Response {
    handle_error(&err);
    error_response(error_to_status(&err), client_message(&err))
}
