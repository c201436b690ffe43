//! Bearer token principal extraction.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use tracing::warn;

use crate::{error::AppError, state::AppState};

/// Resolves the request's principal from its `Authorization` header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Outcomes
///
/// - No `Authorization` header: the request continues anonymously
/// - Valid token: a [`crate::domain::entities::Principal`] is inserted into the
///   request extensions
/// - Anything else: `401 Unauthorized` with `WWW-Authenticate: Bearer`
///
/// Handlers read the principal with `Option<Extension<Principal>>`.
///
/// # Example
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/urls", post(create_link_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), principal::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !req.headers().contains_key(AUTHORIZATION) {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            warn!("Rejected Authorization header without a bearer token");
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is not a bearer token"}),
            )
        })?;

    let principal = st.auth_service.authenticate(&token)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
