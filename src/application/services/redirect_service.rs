//! Redirect resolution: cache probe, store fallback, click side effects.
//!
//! Only the durable store can fail a redirect. Cache errors and timeouts are
//! treated as misses, cache repopulation runs in the background, and click
//! accounting is handed off without waiting.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::application::services::ClickCounter;
use crate::domain::click_event::ClickEvent;
use crate::domain::click_pipeline::ClickPipeline;
use crate::domain::entities::ShortLink;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug_generator::MAX_CUSTOM_SLUG_LENGTH;

/// Request metadata attached to the click event.
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    pub remote_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Time limits for the two suspension points of a resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTimeouts {
    pub cache: Duration,
    pub store: Duration,
}

impl Default for ResolveTimeouts {
    fn default() -> Self {
        Self {
            cache: Duration::from_millis(250),
            store: Duration::from_secs(2),
        }
    }
}

/// Resolves slugs to redirect targets.
pub struct RedirectService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    pipeline: ClickPipeline,
    counter: ClickCounter,
    timeouts: ResolveTimeouts,
}

impl RedirectService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        pipeline: ClickPipeline,
        timeouts: ResolveTimeouts,
    ) -> Self {
        Self {
            counter: ClickCounter::new(cache.clone(), repository.clone()),
            repository,
            cache,
            pipeline,
            timeouts,
        }
    }

    /// Resolves `slug` to its target URL.
    ///
    /// On success a click event is submitted and the counter is bumped; both
    /// happen after the target is known and neither is awaited.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the slug exists neither in the cache nor
    ///   in the store
    /// - [`AppError::Internal`] if the store fails or exceeds its timeout
    pub async fn resolve(&self, slug: &str, visitor: Visitor) -> Result<String, AppError> {
        if slug.is_empty() || slug.len() > MAX_CUSTOM_SLUG_LENGTH {
            return Err(not_found(slug));
        }

        let link = match self.probe_cache(slug).await {
            Some(link) => link,
            None => self.load_from_store(slug).await?,
        };

        self.dispatch_click(&link.slug, visitor);

        Ok(link.target)
    }

    async fn probe_cache(&self, slug: &str) -> Option<ShortLink> {
        match tokio::time::timeout(self.timeouts.cache, self.cache.get_link(slug)).await {
            Ok(Ok(Some(link))) => {
                counter!("redirect_cache_hits_total").increment(1);
                Some(link)
            }
            Ok(Ok(None)) => {
                counter!("redirect_cache_misses_total").increment(1);
                None
            }
            Ok(Err(e)) => {
                counter!("redirect_cache_errors_total").increment(1);
                warn!(slug = %slug, error = %e, "Cache lookup failed, falling back to store");
                None
            }
            Err(_) => {
                counter!("redirect_cache_errors_total").increment(1);
                warn!(slug = %slug, "Cache lookup timed out, falling back to store");
                None
            }
        }
    }

    async fn load_from_store(&self, slug: &str) -> Result<ShortLink, AppError> {
        let lookup = self.repository.find_by_slug(slug);

        let found = match tokio::time::timeout(self.timeouts.store, lookup).await {
            Ok(result) => result?,
            Err(_) => {
                error!(slug = %slug, timeout = ?self.timeouts.store, "Store lookup timed out");
                return Err(AppError::internal(
                    "Store lookup timed out",
                    json!({ "slug": slug }),
                ));
            }
        };

        let link = found.ok_or_else(|| not_found(slug))?;
        self.repopulate(link.clone());

        Ok(link)
    }

    fn repopulate(&self, link: ShortLink) {
        let cache = self.cache.clone();
        let timeout = self.timeouts.cache;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, cache.set_link(&link.slug, &link, None)).await {
                Ok(Ok(())) => debug!(slug = %link.slug, "Cache repopulated"),
                Ok(Err(e)) => warn!(slug = %link.slug, error = %e, "Cache repopulation failed"),
                Err(_) => warn!(slug = %link.slug, "Cache repopulation timed out"),
            }
        });
    }

    fn dispatch_click(&self, slug: &str, visitor: Visitor) {
        let event = ClickEvent::new(
            slug.to_string(),
            visitor.remote_address,
            visitor.user_agent.as_deref(),
        );

        self.pipeline.submit(event);
        self.counter.increment(slug);
    }
}

fn not_found(slug: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "slug": slug }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::click_sink::{ClickSink, ClickSinkError};
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::MemoryCache;
    use async_trait::async_trait;
    use chrono::Utc;

    struct DiscardSink;

    #[async_trait]
    impl ClickSink for DiscardSink {
        async fn record(&self, _event: &ClickEvent) -> Result<(), ClickSinkError> {
            Ok(())
        }
    }

    fn link(slug: &str) -> ShortLink {
        ShortLink::new(
            slug.to_string(),
            format!("https://example.com/{slug}"),
            None,
            Utc::now(),
        )
    }

    fn resolver(repo: MockLinkRepository, cache: Arc<MemoryCache>) -> RedirectService {
        RedirectService::new(
            Arc::new(repo),
            cache,
            ClickPipeline::new(Arc::new(DiscardSink), 100),
            ResolveTimeouts::default(),
        )
    }

    fn cache() -> Arc<MemoryCache> {
        Arc::new(MemoryCache::new(100, Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().times(0);
        repo.expect_increment_clicks().returning(|_| Ok(()));

        let cache = cache();
        cache.set_link("abc123", &link("abc123"), None).await.unwrap();

        let target = resolver(repo, cache)
            .resolve("abc123", Visitor::default())
            .await
            .unwrap();

        assert_eq!(target, "https://example.com/abc123");
    }

    #[tokio::test]
    async fn test_cache_miss_reads_store_and_repopulates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(|slug| Ok(Some(link(slug))));
        repo.expect_increment_clicks().returning(|_| Ok(()));

        let cache = cache();
        let target = resolver(repo, cache.clone())
            .resolve("abc123", Visitor::default())
            .await
            .unwrap();
        assert_eq!(target, "https://example.com/abc123");

        for _ in 0..100 {
            if cache.get_link("abc123").await.unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cache was not repopulated");
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_falls_back_to_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(|slug| Ok(Some(link(slug))));
        repo.expect_increment_clicks().returning(|_| Ok(()));

        let cache = cache();
        cache
            .set_raw("abc123", "not a snapshot", Duration::from_secs(60))
            .await;

        let target = resolver(repo, cache)
            .resolve("abc123", Visitor::default())
            .await
            .unwrap();

        assert_eq!(target, "https://example.com/abc123");
    }

    #[tokio::test]
    async fn test_missing_slug_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().times(1).returning(|_| Ok(None));

        let result = resolver(repo, cache())
            .resolve("nothere", Visitor::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_oversized_slug_is_not_found_without_lookup() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().times(0);

        let slug = "a".repeat(MAX_CUSTOM_SLUG_LENGTH + 1);
        let result = resolver(repo, cache())
            .resolve(&slug, Visitor::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let result = resolver(repo, cache())
            .resolve("abc123", Visitor::default())
            .await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_resolution_submits_click() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|slug| Ok(Some(link(slug))));
        repo.expect_increment_clicks().returning(|_| Ok(()));

        let pipeline = ClickPipeline::new(Arc::new(DiscardSink), 100);
        let service = RedirectService::new(
            Arc::new(repo),
            cache(),
            pipeline.clone(),
            ResolveTimeouts::default(),
        );

        service.resolve("abc123", Visitor::default()).await.unwrap();
        service.resolve("abc123", Visitor::default()).await.unwrap();

        assert!(pipeline.flush(Duration::from_secs(1)).await);
        assert_eq!(pipeline.stats().processed, 2);
    }
}
