//! Slug generation and validation utilities.
//!
//! Auto-generated slugs are drawn uniformly from a 62-symbol alphanumeric
//! alphabet. Custom slugs supplied by clients are validated separately and may
//! additionally contain `-` and `_`.

use crate::error::AppError;
use rand::Rng;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Alphabet for generated slugs: digits, lowercase, uppercase.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default length of generated slugs (62^6 ≈ 5.6e10 combinations).
pub const DEFAULT_SLUG_LENGTH: usize = 6;

/// Maximum length of a custom slug.
pub const MAX_CUSTOM_SLUG_LENGTH: usize = 64;

/// Character set accepted in custom slugs.
static CUSTOM_SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Slugs that would shadow service routes.
const RESERVED_SLUGS: &[&str] = &["api", "health", "urls"];

/// Generates a random slug of exactly `length` characters.
///
/// Not cryptographically secure; callers retry on collision.
///
/// # Examples
///
/// ```ignore
/// let slug = generate_slug(6);
/// assert_eq!(slug.len(), 6);
/// assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_slug(length: usize) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Validates a user-provided custom slug.
///
/// # Rules
///
/// - Length: 1-64 characters
/// - Allowed characters: ASCII letters, digits, `-`, `_`
/// - Cannot be a reserved route segment (`api`, `health`, `urls`)
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > MAX_CUSTOM_SLUG_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom slug must be 1-{MAX_CUSTOM_SLUG_LENGTH} characters"),
            json!({ "provided_length": slug.len() }),
        ));
    }

    if !CUSTOM_SLUG_REGEX.is_match(slug) {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}
