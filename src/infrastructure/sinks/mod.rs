//! Click event sinks consumed by the click pipeline.

mod log_sink;
mod pg_click_sink;

pub use log_sink::LogClickSink;
pub use pg_click_sink::PgClickSink;
