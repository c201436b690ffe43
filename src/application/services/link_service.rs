//! Link creation, lookup and listing.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{NewShortLink, Principal, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug_generator::{DEFAULT_SLUG_LENGTH, generate_slug, validate_custom_slug};
use crate::utils::target_url::validate_target;

/// Attempts for an auto-generated slug: the first try plus five retries.
pub const MAX_SLUG_ATTEMPTS: usize = 6;

/// Tunables for [`LinkService`].
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Public origin used to build `shortUrl`.
    pub base_url: String,
    pub slug_length: usize,
    /// Upper bound for cache calls made while creating or reading links.
    pub cache_timeout: Duration,
    /// Upper bound for store reads and the store health check.
    pub store_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            slug_length: DEFAULT_SLUG_LENGTH,
            cache_timeout: Duration::from_millis(250),
            store_timeout: Duration::from_secs(2),
        }
    }
}

/// Service for creating and reading short links.
///
/// Slug uniqueness is decided by the store alone: every candidate is inserted
/// directly and a duplicate comes back as [`AppError::Conflict`]. There is no
/// check-then-insert window.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            settings,
        }
    }

    /// Creates a short link.
    ///
    /// # Arguments
    ///
    /// - `target` - URL to redirect to; trimmed, otherwise stored verbatim
    /// - `custom_slug` - requested slug; blank means auto-generate
    /// - `owner` - creating principal, recorded as the link owner
    ///
    /// On success the cache is primed with the new link. Priming failures are
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a missing or non-http(s) target, or an
    ///   invalid custom slug
    /// - [`AppError::Conflict`] if the custom slug is taken
    /// - [`AppError::Exhausted`] if [`MAX_SLUG_ATTEMPTS`] generated slugs collided
    /// - [`AppError::Internal`] on store errors
    pub async fn create_link(
        &self,
        target: Option<&str>,
        custom_slug: Option<&str>,
        owner: Option<&Principal>,
    ) -> Result<ShortLink, AppError> {
        let target = validate_target(target.unwrap_or_default()).map_err(|e| {
            AppError::bad_request(e.to_string(), json!({ "field": "target" }))
        })?;
        let owner_id = owner.map(|p| p.id.clone());

        let link = match custom_slug.map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => self.create_with_custom_slug(slug, target, owner_id).await?,
            None => self.create_with_generated_slug(target, owner_id).await?,
        };

        info!(slug = %link.slug, target = %link.target, "Short link created");
        self.prime_cache(&link).await;

        Ok(link)
    }

    async fn create_with_custom_slug(
        &self,
        slug: &str,
        target: String,
        owner_id: Option<String>,
    ) -> Result<ShortLink, AppError> {
        validate_custom_slug(slug)?;

        self.repository
            .create(NewShortLink::new(slug.to_string(), target, owner_id))
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => {
                    AppError::conflict("Custom slug taken", json!({ "slug": slug }))
                }
                other => other,
            })
    }

    async fn create_with_generated_slug(
        &self,
        target: String,
        owner_id: Option<String>,
    ) -> Result<ShortLink, AppError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = generate_slug(self.settings.slug_length);
            let new_link = NewShortLink::new(slug, target.clone(), owner_id.clone());

            match self.repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated slug collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_SLUG_ATTEMPTS,
            slug_length = self.settings.slug_length,
            "Slug generation exhausted"
        );
        Err(AppError::exhausted(
            "slug gen failed",
            json!({ "attempts": MAX_SLUG_ATTEMPTS }),
        ))
    }

    async fn prime_cache(&self, link: &ShortLink) {
        let write = self.cache.set_link(&link.slug, link, None);

        match tokio::time::timeout(self.settings.cache_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(slug = %link.slug, error = %e, "Failed to prime cache"),
            Err(_) => warn!(slug = %link.slug, "Cache priming timed out"),
        }
    }

    /// Returns a link with its best known click count.
    ///
    /// The count is the larger of the stored value and the cache counter; a
    /// failed counter read leaves the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist, and
    /// [`AppError::Internal`] if the store fails or exceeds its timeout.
    pub async fn get_link(&self, slug: &str) -> Result<ShortLink, AppError> {
        let lookup = self.repository.find_by_slug(slug);
        let found = match tokio::time::timeout(self.settings.store_timeout, lookup).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(slug = %slug, timeout = ?self.settings.store_timeout, "Store lookup timed out");
                return Err(AppError::internal(
                    "Store lookup timed out",
                    json!({ "slug": slug }),
                ));
            }
        };
        let mut link = found.ok_or_else(|| {
            AppError::not_found("Short link not found", json!({ "slug": slug }))
        })?;

        let read = self.cache.get_counter(slug);
        match tokio::time::timeout(self.settings.cache_timeout, read).await {
            Ok(Ok(Some(count))) => {
                let count = i64::try_from(count).unwrap_or(i64::MAX);
                link.click_count = link.click_count.max(count);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => debug!(slug = %slug, error = %e, "Click counter unavailable"),
            Err(_) => debug!(slug = %slug, "Click counter read timed out"),
        }

        Ok(link)
    }

    /// Lists the principal's links, newest first.
    pub async fn list_for_owner(&self, owner: &Principal) -> Result<Vec<ShortLink>, AppError> {
        self.repository.find_by_owner(&owner.id).await
    }

    /// Builds the public short URL for a slug.
    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), slug)
    }

    /// Returns true if the durable store answers.
    pub async fn check_store(&self) -> bool {
        match tokio::time::timeout(self.settings.store_timeout, self.repository.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Store health check failed");
                false
            }
            Err(_) => {
                warn!(timeout = ?self.settings.store_timeout, "Store health check timed out");
                false
            }
        }
    }
}
