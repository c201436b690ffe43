//! Utility functions for slug generation and input validation.
//!
//! - [`slug_generator`] - Random slug generation and custom slug validation
//! - [`target_url`] - Redirect target validation

pub mod slug_generator;
pub mod target_url;
