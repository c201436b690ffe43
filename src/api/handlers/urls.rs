//! Handlers for link creation, lookup and listing.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::urls::{CreateLinkRequest, CreateLinkResponse, LinkResponse};
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /urls` (also `POST /api/urls`)
///
/// # Request Body
///
/// ```json
/// { "target": "https://example.com", "customSlug": "promo" }
/// ```
///
/// `customSlug` is optional. An authenticated caller becomes the link owner.
///
/// # Response
///
/// ```json
/// { "shortUrl": "http://localhost:3000/promo", "slug": "promo" }
/// ```
///
/// # Errors
///
/// - 400 for a malformed body, missing or non-http(s) target, or invalid slug
/// - 401 for an invalid bearer token
/// - 409 if `customSlug` is taken
/// - 500 if slug generation is exhausted or the store fails
pub async fn create_link_handler(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<Json<CreateLinkResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(
            "Invalid JSON body",
            json!({ "reason": rejection.body_text() }),
        )
    })?;
    payload.validate()?;

    let owner = principal.map(|Extension(principal)| principal);

    let link = state
        .link_service
        .create_link(
            payload.target.as_deref(),
            payload.custom_slug.as_deref(),
            owner.as_ref(),
        )
        .await?;

    Ok(Json(CreateLinkResponse {
        short_url: state.link_service.short_url(&link.slug),
        slug: link.slug,
    }))
}

/// Returns a single link with its click count.
///
/// # Endpoint
///
/// `GET /urls/{slug}` (also `GET /api/urls/{slug}`)
///
/// Public; no principal required.
pub async fn get_link_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(&slug).await?;
    let short_url = state.link_service.short_url(&link.slug);

    Ok(Json(LinkResponse::new(link, short_url)))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /urls` (also `GET /api/urls`)
///
/// # Errors
///
/// 401 if the request carries no principal.
pub async fn list_links_handler(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let Some(Extension(principal)) = principal else {
        return Err(AppError::unauthorized(
            "authentication required",
            json!({ "reason": "Listing links requires a bearer token" }),
        ));
    };

    let links = state.link_service.list_for_owner(&principal).await?;

    Ok(Json(
        links
            .into_iter()
            .map(|link| {
                let short_url = state.link_service.short_url(&link.slug);
                LinkResponse::new(link, short_url)
            })
            .collect(),
    ))
}
