//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and click delivery.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis, in-process and no-op implementations)
//! - [`persistence`] - Durable link store implementations
//! - [`sinks`] - Click event consumers

pub mod cache;
pub mod persistence;
pub mod sinks;
