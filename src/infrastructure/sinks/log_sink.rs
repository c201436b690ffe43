//! Click sink that writes events to the application log.

use async_trait::async_trait;
use tracing::info;

use crate::domain::click_event::ClickEvent;
use crate::domain::click_sink::{ClickSink, ClickSinkError};

/// Logs every click at INFO. Default sink (`CLICK_SINK=log`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogClickSink;

#[async_trait]
impl ClickSink for LogClickSink {
    async fn record(&self, event: &ClickEvent) -> Result<(), ClickSinkError> {
        info!(
            slug = %event.slug,
            observed_at = %event.observed_at.to_rfc3339(),
            remote_address = event.remote_address.as_deref().unwrap_or("-"),
            user_agent = event.user_agent.as_deref().unwrap_or("-"),
            "click"
        );
        Ok(())
    }
}
