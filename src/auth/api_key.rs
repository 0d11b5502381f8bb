//! Pre-shared API key validation for trusted server callers (webhooks)

use crate::{
    auth::bearer::extract_credential,
    error::{AppError, AuthFailure},
};
use axum::http::HeaderMap;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const API_KEY_SCHEME: &str = "ApiKey";

/// Validates `Authorization: ApiKey <key>` against one configured key.
///
/// Both sides are reduced to SHA-256 digests before a constant-time compare,
/// so neither key content nor key length shows up in timing.
pub struct ApiKeyValidator {
    /// `None` when no key is configured; every request is then refused
    expected_digest: Option<[u8; 32]>,
}

impl ApiKeyValidator {
    pub fn new(configured_key: &Secret<String>) -> Self {
        let key = configured_key.expose_secret();
        if key.is_empty() {
            tracing::warn!("No API key configured, webhook callers will be refused");
            return Self {
                expected_digest: None,
            };
        }

        Self {
            expected_digest: Some(digest(key)),
        }
    }

    pub fn validate(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let presented = extract_credential(headers, API_KEY_SCHEME)?;

        let Some(expected) = &self.expected_digest else {
            return Err(AppError::Unauthorized(AuthFailure::ApiKeyMismatch));
        };

        if bool::from(digest(presented)[..].ct_eq(&expected[..])) {
            Ok(())
        } else {
            tracing::debug!("API key mismatch");
            Err(AppError::Unauthorized(AuthFailure::ApiKeyMismatch))
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// Check the API key in `headers` against `configured_key`
pub fn validate_api_key(headers: &HeaderMap, configured_key: &Secret<String>) -> Result<(), AppError> {
    ApiKeyValidator::new(configured_key).validate(headers)
}
