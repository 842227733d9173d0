//! Axum router configuration
//!
//! ```text
//! /
//! ├── POST /         - enrollment (path kept from the original endpoint)
//! ├── POST /enroll   - enrollment
//! └── GET  /health   - liveness plus enrolled-user count
//! ```
//!
//! GET on the enrollment paths answers `405`: credentials are never taken
//! from a query string.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::middleware::log_request;
use crate::protocol::{SharedService, enroll, health};

/// Build the complete router with all routes
pub fn build_router(service: SharedService) -> Router {
    Router::new()
        .route("/", post(enroll))
        .route("/enroll", post(enroll))
        .route("/health", get(health))
        .layer(middleware::from_fn(log_request))
        .with_state(service)
}
