//! No-op cache implementation for disabled caching.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::ShortLink;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache implementation that stores nothing.
///
/// Every lookup misses, so each redirect is served from the durable store.
/// Selected with `CACHE_BACKEND=none`.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_link(&self, _slug: &str) -> CacheResult<Option<ShortLink>> {
        Ok(None)
    }

    async fn set_link(
        &self,
        _slug: &str,
        _link: &ShortLink,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn increment_counter(&self, _slug: &str) -> Option<u64> {
        None
    }

    async fn get_counter(&self, _slug: &str) -> CacheResult<Option<u64>> {
        Ok(None)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
