//! ShortLink entity: the slug to target mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL.
///
/// `slug`, `target`, `owner_id` and `created_at` never change after creation.
/// `click_count` is advanced out of band by the click counter and may lag
/// behind the real number of redirects.
///
/// The same structure is serialized as the cache snapshot, so the field names
/// are part of the cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub slug: String,
    pub target: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Reserved for link expiry; resolution ignores it.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub click_count: i64,
}

impl ShortLink {
    /// Creates a ShortLink with no expiry and a zero click count.
    pub fn new(
        slug: String,
        target: String,
        owner_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            slug,
            target,
            owner_id,
            created_at,
            expires_at: None,
            click_count: 0,
        }
    }

    /// Returns true if the link belongs to the given principal.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id.as_deref() == Some(owner_id)
    }
}

/// Input data for inserting a new link into the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortLink {
    pub slug: String,
    pub target: String,
    pub owner_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewShortLink {
    pub fn new(slug: String, target: String, owner_id: Option<String>) -> Self {
        Self {
            slug,
            target,
            owner_id,
            expires_at: None,
        }
    }
}
