//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{
    AuthService, LinkService, LinkSettings, RedirectService, ResolveTimeouts,
};
use crate::config::Config;
use crate::domain::click_pipeline::ClickPipeline;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug_generator::DEFAULT_SLUG_LENGTH;

/// Tunables the services need from the configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub slug_length: usize,
    pub cache_timeout: Duration,
    pub store_timeout: Duration,
    pub token_signing_secret: String,
}

impl ServiceSettings {
    /// Default settings with the given token signing secret.
    pub fn new(token_signing_secret: impl Into<String>) -> Self {
        let timeouts = ResolveTimeouts::default();

        Self {
            base_url: "http://localhost:3000".to_string(),
            slug_length: DEFAULT_SLUG_LENGTH,
            cache_timeout: timeouts.cache,
            store_timeout: timeouts.store,
            token_signing_secret: token_signing_secret.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            slug_length: config.slug_length,
            cache_timeout: config.cache_timeout(),
            store_timeout: config.store_timeout(),
            token_signing_secret: config.token_signing_secret.clone(),
        }
    }
}

/// Handles to the services behind the HTTP surface. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn CacheService>,
    pub click_pipeline: ClickPipeline,
}

impl AppState {
    /// Wires the services around one store, one cache and one click pipeline.
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        click_pipeline: ClickPipeline,
        settings: ServiceSettings,
    ) -> Self {
        let link_service = LinkService::new(
            repository.clone(),
            cache.clone(),
            LinkSettings {
                base_url: settings.base_url,
                slug_length: settings.slug_length,
                cache_timeout: settings.cache_timeout,
                store_timeout: settings.store_timeout,
            },
        );

        let redirect_service = RedirectService::new(
            repository,
            cache.clone(),
            click_pipeline.clone(),
            ResolveTimeouts {
                cache: settings.cache_timeout,
                store: settings.store_timeout,
            },
        );

        Self {
            link_service: Arc::new(link_service),
            redirect_service: Arc::new(redirect_service),
            auth_service: Arc::new(AuthService::new(settings.token_signing_secret)),
            cache,
            click_pipeline,
        }
    }
}
