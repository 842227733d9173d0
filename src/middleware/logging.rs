//! Logging middleware
//!
//! Logs one line per request: peer, method, path, status and latency. The
//! query string is left out so nothing submitted in a URL reaches the log.

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use log::info;
use std::net::SocketAddr;
use std::time::Instant;

/// Log a request and its outcome
pub async fn log_request(request: Request, next: Next) -> Response {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "Client {} {} {} -> {} ({} ms)",
        client_addr,
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    response
}
