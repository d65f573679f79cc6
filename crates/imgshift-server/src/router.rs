//! Router assembly.
//!
//! Layers (outermost first): trace, optional timeout, body limit.
//!
//! The timeout answers 408 and drops the handler future. A pipeline run
//! already handed to `spawn_blocking` cannot be cancelled: it finishes on
//! the blocking pool and its result is discarded. The timeout therefore
//! bounds response latency, not CPU spent per request.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers;

/// Build the service router for `config`.
pub fn router(config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/process-base64", post(handlers::process_base64))
        .route("/process-binary", post(handlers::process_binary))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()));

    if let Some(timeout) = config.request_timeout() {
        app = app.layer(TimeoutLayer::new(timeout));
    }

    app.layer(TraceLayer::new_for_http())
}
