//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single resolved redirect, as observed by the redirect handler.
///
/// Events are produced on the redirect path and handed to the
/// [`crate::domain::click_pipeline::ClickPipeline`], which delivers each one
/// to its sink exactly once. They are not persisted by the pipeline itself.
///
/// Serialized as `{slug, observedAt, remoteAddress, userAgent}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub slug: String,
    pub observed_at: DateTime<Utc>,
    pub remote_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(
    ///     "abc123".to_string(),
    ///     Some("192.168.1.1".to_string()),
    ///     Some("Mozilla/5.0"),
    /// );
    /// ```
    pub fn new(slug: String, remote_address: Option<String>, user_agent: Option<&str>) -> Self {
        Self {
            slug,
            observed_at: Utc::now(),
            remote_address,
            user_agent: user_agent.map(|s| s.to_string()),
        }
    }
}
