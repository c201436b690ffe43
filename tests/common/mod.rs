#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::Layer;
use url_redirector::domain::click_event::ClickEvent;
use url_redirector::domain::click_pipeline::ClickPipeline;
use url_redirector::domain::click_sink::{ClickSink, ClickSinkError};
use url_redirector::domain::entities::{NewShortLink, ShortLink};
use url_redirector::domain::repositories::LinkRepository;
use url_redirector::error::AppError;
use url_redirector::infrastructure::cache::{CacheError, CacheResult, CacheService, MemoryCache};
use url_redirector::infrastructure::persistence::InMemoryLinkRepository;
use url_redirector::routes::app_router;
use url_redirector::state::{AppState, ServiceSettings};

pub const TEST_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://s.test";

/// Inserts `ConnectInfo` the way `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Records every delivered event and the highest number of concurrent
/// `record` calls observed.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ClickEvent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<ClickEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn slugs(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.slug).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClickSink for RecordingSink {
    async fn record(&self, event: &ClickEvent) -> Result<(), ClickSinkError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        self.events.lock().unwrap().push(event.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory store that counts slug lookups.
#[derive(Default)]
pub struct CountingRepository {
    inner: InMemoryLinkRepository,
    lookups: AtomicUsize,
}

impl CountingRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkRepository for CountingRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        self.inner.create(new_link).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_slug(slug).await
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>, AppError> {
        self.inner.find_by_owner(owner_id).await
    }

    async fn increment_clicks(&self, slug: &str) -> Result<(), AppError> {
        self.inner.increment_clicks(slug).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

/// Store that answers every call after `delay`.
pub struct SlowRepository {
    inner: InMemoryLinkRepository,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryLinkRepository::new(),
            delay,
        })
    }
}

#[async_trait]
impl LinkRepository for SlowRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        self.inner.create(new_link).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_slug(slug).await
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>, AppError> {
        self.inner.find_by_owner(owner_id).await
    }

    async fn increment_clicks(&self, slug: &str) -> Result<(), AppError> {
        self.inner.increment_clicks(slug).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        tokio::time::sleep(self.delay).await;
        self.inner.ping().await
    }
}

/// Store whose every call fails.
pub struct BrokenRepository;

#[async_trait]
impl LinkRepository for BrokenRepository {
    async fn create(&self, _new_link: NewShortLink) -> Result<ShortLink, AppError> {
        Err(store_down())
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<ShortLink>, AppError> {
        Err(store_down())
    }

    async fn find_by_owner(&self, _owner_id: &str) -> Result<Vec<ShortLink>, AppError> {
        Err(store_down())
    }

    async fn increment_clicks(&self, _slug: &str) -> Result<(), AppError> {
        Err(store_down())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(store_down())
    }
}

fn store_down() -> AppError {
    AppError::internal("Database error", serde_json::json!({ "reason": "connection refused" }))
}

/// Cache that is down: every call errors, or hangs when `hang` is set.
pub struct UnreachableCache {
    hang: bool,
}

impl UnreachableCache {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { hang: false })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self { hang: true })
    }

    async fn outage<T>(&self) -> CacheResult<T> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(CacheError::Connection("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheService for UnreachableCache {
    async fn get_link(&self, _slug: &str) -> CacheResult<Option<ShortLink>> {
        self.outage().await
    }

    async fn set_link(
        &self,
        _slug: &str,
        _link: &ShortLink,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.outage().await
    }

    async fn increment_counter(&self, _slug: &str) -> Option<u64> {
        self.outage::<u64>().await.ok()
    }

    async fn get_counter(&self, _slug: &str) -> CacheResult<Option<u64>> {
        self.outage().await
    }

    async fn health_check(&self) -> bool {
        false
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(1_000, Duration::from_secs(60)))
}

pub fn settings() -> ServiceSettings {
    let mut settings = ServiceSettings::new(TEST_SECRET);
    settings.base_url = BASE_URL.to_string();
    settings.cache_timeout = Duration::from_millis(100);
    settings.store_timeout = Duration::from_millis(500);
    settings
}

pub fn create_test_state(
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    sink: Arc<dyn ClickSink>,
) -> AppState {
    AppState::new(repository, cache, ClickPipeline::new(sink, 1_000), settings())
}

/// State over an in-memory store, an in-process cache and a recording sink.
pub fn create_memory_state() -> (AppState, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let state = create_test_state(
        Arc::new(InMemoryLinkRepository::new()),
        memory_cache(),
        sink.clone(),
    );
    (state, sink)
}

/// Serves the full application router, with a fixed peer address.
pub fn test_server(state: AppState) -> TestServer {
    let app = Router::new()
        .fallback_service(app_router(state))
        .layer(MockConnectInfoLayer);

    TestServer::new(app).unwrap()
}

pub fn bearer(owner: &str) -> String {
    let token = url_redirector::application::services::AuthService::new(TEST_SECRET)
        .issue_token(owner);
    format!("Bearer {token}")
}

/// Polls `check` until it returns true or `timeout` elapses.
pub async fn wait_for<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
