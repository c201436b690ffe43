//! Link API route configuration.

use crate::api::handlers::{create_link_handler, get_link_handler, list_links_handler};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Link API routes, mounted under both `/urls` and `/api/urls`.
///
/// # Endpoints
///
/// - `POST /`        - Create a short link (principal optional)
/// - `GET  /`        - List the principal's links (principal required)
/// - `GET  /{slug}`  - Link details with click count (public)
pub fn url_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_links_handler).post(create_link_handler))
        .route("/{slug}", get(get_link_handler))
}
