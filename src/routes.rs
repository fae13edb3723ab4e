//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health` - Health check: DB, cache, catalog provisioning
//! - `/api/*`       - REST API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket, stricter for pulls
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let (pulls, reads) = if behind_proxy {
        (
            api::routes::pull_routes().layer(rate_limit::pull_proxy_layer()),
            api::routes::public_routes().layer(rate_limit::proxy_layer()),
        )
    } else {
        (
            api::routes::pull_routes().layer(rate_limit::pull_layer()),
            api::routes::public_routes().layer(rate_limit::layer()),
        )
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", pulls.merge(reads))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
