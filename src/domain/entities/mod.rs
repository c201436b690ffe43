//! Core domain entities.
//!
//! - [`ShortLink`] - a slug to target mapping as stored and cached
//! - [`NewShortLink`] - input for inserting a link into the durable store
//! - [`Principal`] - the verified owner behind a request
//!
//! Entities are plain data; validation lives in the services and utilities
//! that construct them.

pub mod principal;
pub mod short_link;

pub use principal::Principal;
pub use short_link::{NewShortLink, ShortLink};
