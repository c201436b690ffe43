mod common;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url_redirector::domain::click_event::ClickEvent;
use url_redirector::domain::click_pipeline::ClickPipeline;
use url_redirector::infrastructure::persistence::InMemoryLinkRepository;
use url_redirector::state::AppState;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (state, _sink) = common::create_memory_state();
    let server = common::test_server(state);

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["store"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert_eq!(json["checks"]["click_pipeline"]["status"], "ok");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let (state, _sink) = common::create_memory_state();
    let server = common::test_server(state);

    let json = server.get("/health").await.json::<Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("store").is_some());
    assert!(json["checks"].get("cache").is_some());

    let pipeline = &json["checks"]["click_pipeline"];
    assert_eq!(pipeline["stats"]["state"], "idle");
    assert_eq!(pipeline["stats"]["queued"], 0);
    assert_eq!(pipeline["stats"]["capacity"], 1_000);
}

#[tokio::test]
async fn test_health_cache_outage_is_degraded_but_available() {
    let state = common::create_test_state(
        Arc::new(InMemoryLinkRepository::new()),
        common::UnreachableCache::failing(),
        common::RecordingSink::new(),
    );
    let server = common::test_server(state);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["cache"]["status"], "error");
    assert_eq!(json["checks"]["store"]["status"], "ok");
}

#[tokio::test]
async fn test_health_store_outage_is_unavailable() {
    let state = common::create_test_state(
        Arc::new(common::BrokenRepository),
        common::memory_cache(),
        common::RecordingSink::new(),
    );
    let server = common::test_server(state);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["store"]["status"], "error");
}

#[tokio::test]
async fn test_health_slow_store_is_unavailable() {
    let state = common::create_test_state(
        common::SlowRepository::new(Duration::from_secs(5)),
        common::memory_cache(),
        common::RecordingSink::new(),
    );
    let server = common::test_server(state);

    let started = std::time::Instant::now();
    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    assert!(started.elapsed() < Duration::from_secs(2));
    let json = response.json::<Value>();
    assert_eq!(json["checks"]["store"]["status"], "error");
}

#[tokio::test]
async fn test_health_full_click_queue_is_unavailable() {
    let sink = common::RecordingSink::slow(Duration::from_secs(60));
    let pipeline = ClickPipeline::new(sink, 2);
    let state = AppState::new(
        Arc::new(InMemoryLinkRepository::new()),
        common::memory_cache(),
        pipeline.clone(),
        common::settings(),
    );
    let server = common::test_server(state);

    // Let the consumer pick up the first event and block in the sink.
    pipeline.submit(ClickEvent::new("stuck".to_string(), None, None));
    tokio::time::sleep(Duration::from_millis(20)).await;
    while !pipeline.is_saturated() {
        pipeline.submit(ClickEvent::new("stuck".to_string(), None, None));
    }

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<Value>();
    assert_eq!(json["checks"]["click_pipeline"]["status"], "error");
    assert_eq!(json["checks"]["click_pipeline"]["stats"]["state"], "draining");
}
