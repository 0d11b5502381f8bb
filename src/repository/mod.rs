//! Storage collaborators
//!
//! The auth core only sees these traits; every method is atomic for a single
//! record. PostgreSQL and in-memory implementations are provided.

pub mod auth_repo;
pub mod memory;
pub mod user_repo;

pub use auth_repo::AuthRepository;
pub use memory::{InMemoryCredentialStore, InMemoryRefreshTokenStore};
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{auth::RefreshTokenRecord, user::Credential},
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Mark a token revoked. Returns `false` if it was unknown or already revoked.
    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Revoke every live token of a user, returning how many were revoked
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `BadRequest` if the email is already registered
    async fn create(&self, email: &str, hashed_password: &str) -> Result<Credential, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError>;

    /// Replace email and hash of an existing user; `None` if the user is gone
    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<Credential>, AppError>;
}
