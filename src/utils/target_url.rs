//! Target URL validation.
//!
//! Targets are stored exactly as submitted (after trimming whitespace) so the
//! redirect `Location` echoes what the client asked for. Validation only
//! checks that the value parses as an absolute URL with an allowed scheme.

use url::Url;

/// Maximum accepted length of a target URL.
pub const MAX_TARGET_LENGTH: usize = 2048;

/// Errors that can occur during target validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetUrlError {
    #[error("target required")]
    Missing,

    #[error("target must start with http:// or https://")]
    UnsupportedScheme,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("target must be at most {MAX_TARGET_LENGTH} characters")]
    TooLong,
}

/// Validates a redirect target and returns its trimmed form.
///
/// # Rules
///
/// 1. Non-blank after trimming
/// 2. Scheme is `http` or `https` (case-insensitive)
/// 3. Parses as an absolute URL with a host
/// 4. At most [`MAX_TARGET_LENGTH`] characters
///
/// # Errors
///
/// Returns the first rule that fails as a [`TargetUrlError`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(validate_target(" https://example.com ").unwrap(), "https://example.com");
/// assert!(validate_target("ftp://x").is_err());
/// ```
pub fn validate_target(input: &str) -> Result<String, TargetUrlError> {
    let target = input.trim();

    if target.is_empty() {
        return Err(TargetUrlError::Missing);
    }

    if target.len() > MAX_TARGET_LENGTH {
        return Err(TargetUrlError::TooLong);
    }

    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(TargetUrlError::UnsupportedScheme);
    }

    let url = Url::parse(target).map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(TargetUrlError::InvalidFormat("missing host".to_string()));
    }

    Ok(target.to_string())
}
