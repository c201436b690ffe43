//! Consumer seam for the click event pipeline.

use async_trait::async_trait;

use crate::domain::click_event::ClickEvent;

/// Failure to deliver a click event to its sink.
#[derive(Debug, thiserror::Error)]
pub enum ClickSinkError {
    #[error("Click sink storage error: {0}")]
    Storage(String),

    #[error("Click sink rejected event: {0}")]
    Rejected(String),
}

/// Downstream consumer of click events.
///
/// The pipeline calls [`ClickSink::record`] for one event at a time, in
/// submission order. A failed event is logged and skipped; it never stops the
/// pipeline.
///
/// # Implementations
///
/// - [`crate::infrastructure::sinks::LogClickSink`] - writes events to the log
/// - [`crate::infrastructure::sinks::PgClickSink`] - inserts into `link_clicks`
#[async_trait]
pub trait ClickSink: Send + Sync {
    async fn record(&self, event: &ClickEvent) -> Result<(), ClickSinkError>;
}
