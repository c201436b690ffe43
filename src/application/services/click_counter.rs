//! Best-effort per-slug click counting.

use std::sync::Arc;

use metrics::counter;
use tracing::{trace, warn};

use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Fires counter increments without waiting for them.
///
/// Each click bumps two counters: the fast one in the cache and the stored
/// `click_count`. The stored count survives cache eviction and restarts, so
/// the reported count never goes down. Counting twice for one click, or not
/// at all when a counter store is down, is accepted. Nothing here can fail a
/// redirect.
#[derive(Clone)]
pub struct ClickCounter {
    cache: Arc<dyn CacheService>,
    repository: Arc<dyn LinkRepository>,
}

impl ClickCounter {
    pub fn new(cache: Arc<dyn CacheService>, repository: Arc<dyn LinkRepository>) -> Self {
        Self { cache, repository }
    }

    /// Schedules an increment of the counters for `slug` and returns at once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn increment(&self, slug: &str) {
        let cache = self.cache.clone();
        let cache_slug = slug.to_string();
        tokio::spawn(async move {
            if let Some(value) = cache.increment_counter(&cache_slug).await {
                trace!(slug = %cache_slug, value, "Click counter incremented");
            }
        });

        let repository = self.repository.clone();
        let slug = slug.to_string();
        tokio::spawn(async move {
            if let Err(e) = repository.increment_clicks(&slug).await {
                counter!("click_counter_failures_total").increment(1);
                warn!(slug = %slug, error = %e, "Failed to persist click count");
            }
        });
    }
}
