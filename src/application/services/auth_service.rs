//! Principal token issuing and verification.
//!
//! A token is `<base64url(owner_id)>.<hex(HMAC-SHA256(owner_id))>`, keyed by
//! the server signing secret. Tokens carry no expiry; rotating the secret
//! invalidates all of them.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::warn;

use crate::domain::entities::Principal;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,
}

/// Issues and verifies principal bearer tokens.
///
/// An attacker without the signing secret can neither forge a token for
/// another owner nor alter the owner id inside an existing one.
#[derive(Clone)]
pub struct AuthService {
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were issued.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    fn mac(&self, owner_id: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(owner_id.as_bytes());
        mac
    }

    /// Issues a bearer token for `owner_id`.
    pub fn issue_token(&self, owner_id: &str) -> String {
        let signature = hex::encode(self.mac(owner_id).finalize().into_bytes());
        format!("{}.{}", URL_SAFE_NO_PAD.encode(owner_id), signature)
    }

    /// Verifies a token and returns the principal it was issued for.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Malformed`] if the token is not two valid segments
    ///   or names an empty owner
    /// - [`CredentialError::BadSignature`] if the MAC does not match
    pub fn verify(&self, token: &str) -> Result<Principal, CredentialError> {
        let (encoded_owner, signature) = token
            .trim()
            .split_once('.')
            .ok_or(CredentialError::Malformed)?;

        let owner_bytes = URL_SAFE_NO_PAD
            .decode(encoded_owner)
            .map_err(|_| CredentialError::Malformed)?;
        let owner_id = String::from_utf8(owner_bytes).map_err(|_| CredentialError::Malformed)?;
        if owner_id.is_empty() {
            return Err(CredentialError::Malformed);
        }

        let signature = hex::decode(signature).map_err(|_| CredentialError::Malformed)?;

        self.mac(&owner_id)
            .verify_slice(&signature)
            .map_err(|_| CredentialError::BadSignature)?;

        Ok(Principal::new(owner_id))
    }

    /// Verifies a token presented on a request.
    ///
    /// Rejections are logged and surfaced as [`AppError::Unauthorized`].
    pub fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        self.verify(token).map_err(|e| {
            warn!(reason = %e, "Rejected bearer token");
            AppError::unauthorized("Unauthorized", json!({ "reason": e.to_string() }))
        })
    }
}
