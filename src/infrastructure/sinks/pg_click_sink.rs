//! Click sink persisting events to PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::click_sink::{ClickSink, ClickSinkError};

/// Number of insert attempts per event.
const MAX_ATTEMPTS: usize = 3;

/// Inserts each click into `link_clicks` (`CLICK_SINK=postgres`).
///
/// Transient failures are retried with jittered exponential backoff, starting
/// at 10ms. An event that still fails after [`MAX_ATTEMPTS`] is reported to the
/// pipeline, which counts it as failed and moves on.
pub struct PgClickSink {
    pool: Arc<PgPool>,
}

impl PgClickSink {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn insert(&self, event: &ClickEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO link_clicks (slug, observed_at, remote_address, user_agent)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&event.slug)
        .bind(event.observed_at)
        .bind(&event.remote_address)
        .bind(&event.user_agent)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ClickSink for PgClickSink {
    async fn record(&self, event: &ClickEvent) -> Result<(), ClickSinkError> {
        let strategy = ExponentialBackoff::from_millis(10)
            .map(jitter)
            .take(MAX_ATTEMPTS - 1);

        Retry::start(strategy, move || async move {
            self.insert(event).await.inspect_err(|e| {
                warn!(slug = %event.slug, error = %e, "Click insert failed");
            })
        })
        .await
        .map_err(|e| ClickSinkError::Storage(e.to_string()))?;

        debug!(slug = %event.slug, "Click recorded");
        Ok(())
    }
}
