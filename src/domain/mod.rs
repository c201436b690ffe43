//! Domain layer: entities, the durable store contract and click tracking.
//!
//! # Modules
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Durable store trait definitions
//! - [`click_event`] - Click tracking event model
//! - [`click_sink`] - Consumer seam for click events
//! - [`click_pipeline`] - Ordered single-consumer event queue
//!
//! # Click Processing Flow
//!
//! 1. The redirect resolver builds a [`click_event::ClickEvent`]
//! 2. The event is submitted to the [`click_pipeline::ClickPipeline`] (non-blocking)
//! 3. The pipeline's consumer hands events to a [`click_sink::ClickSink`] one at a time

pub mod click_event;
pub mod click_pipeline;
pub mod click_sink;
pub mod entities;
pub mod repositories;
