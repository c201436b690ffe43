//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`      - Short link redirect (public, not rate limited)
//! - `GET  /health`      - Health check: store, cache, click pipeline (public)
//! - `/urls/*`           - Link API (rate limited, principal optional)
//! - `/api/urls/*`       - Same link API under the browser client's prefix
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on the link API
//! - **Principal extraction** - Bearer token on the link API
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{principal, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The server must provide `ConnectInfo<SocketAddr>`: redirects record the
/// peer address and the rate limiter keys on it.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let url_api = api::routes::url_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            principal::layer,
        ))
        .layer(rate_limit::layer());

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{slug}", get(redirect_handler))
        .nest("/urls", url_api.clone())
        .nest("/api/urls", url_api)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
