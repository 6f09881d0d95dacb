//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: upstream adapters built from configuration
//! - `gateway.rs`: the per-request orchestrator
//! - `transfer.rs`: streaming relay and response headers
//! - `errors.rs`: failure taxonomy and redirect responses
//! - `routes/`: HTTP handlers

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod errors;
pub mod gateway;
pub mod routes;
pub mod services;
pub mod transfer;

pub use gateway::GatewayState;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: GatewayState) -> Router {
    if state.config.secret_key.is_none() {
        tracing::warn!("document secret not configured; all document requests will fail");
    }

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
