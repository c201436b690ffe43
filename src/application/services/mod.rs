//! Business logic services for the application layer.

pub mod auth_service;
pub mod click_counter;
pub mod link_service;
pub mod redirect_service;

pub use auth_service::{AuthService, CredentialError};
pub use click_counter::ClickCounter;
pub use link_service::{LinkService, LinkSettings};
pub use redirect_service::{RedirectService, ResolveTimeouts, Visitor};
