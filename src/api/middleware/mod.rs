//! HTTP middleware for request processing and protection.
//!
//! Provides principal extraction, rate limiting, and observability middleware.

pub mod principal;
pub mod rate_limit;
pub mod tracing;
