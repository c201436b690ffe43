//! Process-local link store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Link store held in memory, selected with `STORE_BACKEND=memory`.
///
/// Uniqueness is enforced under the write lock, so concurrent creates of the
/// same slug behave like the PostgreSQL primary key: exactly one wins and
/// the rest get [`AppError::Conflict`]. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: RwLock<HashMap<String, ShortLink>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut links = self.links.write().await;

        if links.contains_key(&new_link.slug) {
            return Err(AppError::conflict(
                "Resource already exists",
                json!({ "slug": new_link.slug }),
            ));
        }

        let link = ShortLink {
            slug: new_link.slug,
            target: new_link.target,
            owner_id: new_link.owner_id,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            click_count: 0,
        };
        links.insert(link.slug.clone(), link.clone());

        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.links.read().await.get(slug).cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>, AppError> {
        let mut owned: Vec<ShortLink> = self
            .links
            .read()
            .await
            .values()
            .filter(|link| link.is_owned_by(owner_id))
            .cloned()
            .collect();

        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        Ok(owned)
    }

    async fn increment_clicks(&self, slug: &str) -> Result<(), AppError> {
        if let Some(link) = self.links.write().await.get_mut(slug) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
