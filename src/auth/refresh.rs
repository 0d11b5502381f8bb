//! Refresh token lifecycle: create, look up, revoke
//!
//! Refresh tokens are opaque 256-bit random values rendered as 64 hex
//! characters. Only their SHA-256 digest is persisted. Tokens are not rotated
//! on use: a token keeps resolving until it is revoked or expires.

use crate::{
    error::{AppError, AuthFailure},
    models::auth::RefreshTokenRecord,
    repository::RefreshTokenStore,
};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Length of a rendered token in hex characters
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Digest a token value for storage
    pub fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    fn generate() -> Result<String, AppError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!("Random source failed while minting refresh token: {}", e);
            AppError::Internal(format!("random source unavailable: {}", e))
        })?;
        Ok(hex::encode(bytes))
    }

    /// Mint and persist a new refresh token for `user_id`
    pub async fn create(&self, user_id: Uuid) -> Result<String, AppError> {
        let token = Self::generate()?;
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::Internal("refresh token expiry is out of range".to_string())
        })?;

        let record = RefreshTokenRecord {
            token_hash: Self::hash_token(&token),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };

        self.store.insert(&record).await.map_err(|e| {
            tracing::error!(user_id = %user_id, "Failed to store refresh token: {}", e);
            e
        })?;

        tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token created");
        Ok(token)
    }

    /// Resolve a token to its user
    pub async fn lookup(&self, token: &str) -> Result<Uuid, AppError> {
        self.lookup_at(token, Utc::now()).await
    }

    /// Resolve a token as of `now`. Unknown, revoked and expired tokens all
    /// fail with the same `RefreshTokenRejected`.
    pub async fn lookup_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        let rejected = AppError::Unauthorized(AuthFailure::RefreshTokenRejected);

        let Some(record) = self.store.find(&Self::hash_token(token)).await? else {
            tracing::debug!("Refresh token rejected: not found");
            return Err(rejected);
        };

        if record.is_revoked() {
            tracing::debug!(user_id = %record.user_id, "Refresh token rejected: revoked");
            return Err(rejected);
        }

        if record.is_expired_at(now) {
            tracing::debug!(user_id = %record.user_id, "Refresh token rejected: expired");
            return Err(rejected);
        }

        Ok(record.user_id)
    }

    /// Revoke a token. Unknown or already revoked tokens are not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if self.store.revoke(&Self::hash_token(token)).await? {
            metrics::counter!("auth_refresh_tokens_revoked_total").increment(1);
            tracing::debug!("Refresh token revoked");
        } else {
            tracing::debug!("Refresh token revoke was a no-op");
        }
        Ok(())
    }

    /// Revoke every live refresh token of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.store.revoke_all_for_user(user_id).await?;
        metrics::counter!("auth_refresh_tokens_revoked_total").increment(revoked);
        tracing::info!(user_id = %user_id, revoked, "Revoked all refresh tokens for user");
        Ok(revoked)
    }
}
