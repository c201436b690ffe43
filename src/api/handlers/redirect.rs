//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::error;
use url::Url;

use crate::application::services::Visitor;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Responses
///
/// - **302 Found** with `Location: <target>` when the slug resolves
/// - **404 Not Found**, plain text `Not Found`, when the slug does not exist
/// - **500 Internal Server Error**, plain text `Server Error`, when the store
///   fails or times out
///
/// Cache, click pipeline and counter failures never change the response; see
/// [`crate::application::services::RedirectService`].
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let visitor = Visitor {
        remote_address: Some(addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    match state.redirect_service.resolve(&slug, visitor).await {
        Ok(target) => match location(&target) {
            Some(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
            None => {
                error!(slug = %slug, target = %target, "Target cannot be sent as a Location header");
                server_error()
            }
        },
        Err(AppError::NotFound { .. }) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            error!(slug = %slug, error = %e, "Redirect failed");
            server_error()
        }
    }
}

/// Builds the `Location` value, percent-encoding the target only if it
/// contains bytes a header cannot carry verbatim.
fn location(target: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(target).ok().or_else(|| {
        Url::parse(target)
            .ok()
            .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
    })
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
}
