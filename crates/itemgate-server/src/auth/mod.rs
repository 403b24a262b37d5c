//! Bearer token authentication
//!
//! Requests under the versioned API carry `Authorization: Bearer <jwt>`.
//! Tokens are RS256 JWTs issued by the configured identity provider; the
//! verification keys are the provider's JWKS, published at
//! `<issuer>/publickeys` and cached by [`JwksCache`].
//!
//! Failure classes:
//! - no usable credential (missing header, wrong scheme, empty token) is
//!   *unauthenticated* (401)
//! - a credential that was presented but does not verify is *forbidden* (403)
//!
//! On success [`middleware::require_identity`] stores an
//! [`AuthenticatedIdentity`] in the request extensions, where handlers pick it
//! up through the [`CurrentUser`] extractor.

pub mod claims;
pub mod identity;
pub mod jwks;
pub mod middleware;

use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use thiserror::Error;

pub use claims::Claims;
pub use identity::{AuthenticatedIdentity, CurrentUser};
pub use jwks::JwksCache;

/// Scheme prefix of the `Authorization` header, including the separating space
pub const BEARER_PREFIX: &str = "Bearer ";

/// Allowed clock skew when checking `exp` and `nbf`, in seconds
pub const LEEWAY_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingCredentials,

    #[error("token header could not be decoded: {0}")]
    MalformedToken(#[source] jsonwebtoken::errors::Error),

    #[error("token does not name a signing key")]
    MissingKeyId,

    #[error("signing key '{0}' is not in the key set")]
    UnknownKey(String),

    #[error("signing key could not be used: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),

    #[error("token subject is not a UUID")]
    InvalidSubject,

    #[error("failed to load key set from {url}: {source}")]
    KeySetUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl AuthError {
    /// True when no credential was presented at all
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::MissingCredentials)
    }
}

/// Extract the token from an `Authorization` header value
pub fn bearer_token(value: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = value
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingCredentials)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Verifies bearer tokens against the cached key set and the expected issuer
pub struct TokenVerifier {
    keys: Arc<JwksCache>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<JwksCache>, issuer_url: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer_url]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Self { keys, validation }
    }

    /// Verify the credential carried by an `Authorization` header value
    pub async fn verify_header(
        &self,
        value: Option<&HeaderValue>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = bearer_token(value)?;
        self.verify(token).await
    }

    /// Verify a raw compact JWT
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let header = decode_header(token).map_err(AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self.keys.decoding_key(&kid).await?;

        let data = decode::<Claims>(token, &key, &self.validation).map_err(AuthError::Rejected)?;

        data.claims.identity()
    }
}
