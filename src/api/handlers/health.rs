//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::click_pipeline::PipelineState;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Store reachable and click pipeline accepting events. The
///   status is `healthy`, or `degraded` if only the cache is down.
/// - **503 Service Unavailable**: Store unreachable or click pipeline full
///
/// Redirects depend on the store alone, so a cache outage never turns the
/// service unavailable.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Connected" },
///     "click_pipeline": {
///       "status": "ok",
///       "message": "idle, 0/10000 queued",
///       "stats": { "state": "idle", "queued": 0, "capacity": 10000,
///                  "processed": 42, "failed": 0, "dropped": 0 }
///     }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = if state.link_service.check_store().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Store unreachable")
    };

    let cache_check = if state.cache.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Cache unreachable, serving from store")
    };

    let pipeline_check = check_click_pipeline(&state);

    let available = store_check.is_ok() && pipeline_check.is_ok();
    let all_healthy = available && cache_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store: store_check,
            cache: cache_check,
            click_pipeline: pipeline_check,
        },
    };

    if available {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check_click_pipeline(state: &AppState) -> CheckStatus {
    let stats = state.click_pipeline.stats();
    let label = match stats.state {
        PipelineState::Idle => "idle",
        PipelineState::Draining => "draining",
    };
    let summary = format!("{label}, {}/{} queued", stats.queued, stats.capacity);

    let mut check = if stats.queued >= stats.capacity {
        CheckStatus::error(format!("Click queue full: {summary}"))
    } else {
        CheckStatus::ok(summary)
    };
    check.stats = Some(stats);
    check
}
