//! Application layer services implementing business logic.
//!
//! Services orchestrate the domain: they call the durable store through the
//! repository trait, consult the cache and feed click accounting. HTTP
//! handlers and the admin CLI call into these services only.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation, lookup and listing
//! - [`services::redirect_service::RedirectService`] - Slug resolution for redirects
//! - [`services::click_counter::ClickCounter`] - Fire-and-forget click counting
//! - [`services::auth_service::AuthService`] - Principal token verification

pub mod services;
