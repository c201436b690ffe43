//! DTOs for the link creation and lookup endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Request body for `POST /urls`.
///
/// Both fields are optional at the JSON level so that a missing `target`
/// produces the service's own validation message. The length limits only
/// reject oversized payloads; the service applies the precise rules.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub target: Option<String>,

    #[serde(default)]
    #[validate(length(max = 256))]
    pub custom_slug: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkResponse {
    pub short_url: String,
    pub slug: String,
}

/// A link as returned by `GET /urls/{slug}` and `GET /urls`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub slug: String,
    pub target: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub short_url: String,
}

impl LinkResponse {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        Self {
            slug: link.slug,
            target: link.target,
            owner_id: link.owner_id,
            created_at: link.created_at,
            expires_at: link.expires_at,
            click_count: link.click_count,
            short_url,
        }
    }
}
