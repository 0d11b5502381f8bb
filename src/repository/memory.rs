//! In-memory stores
//!
//! Each operation holds the lock for its whole read-modify-write, so callers
//! never observe a partially written record.

use crate::{
    error::AppError,
    models::{auth::RefreshTokenRecord, user::Credential},
    repository::{CredentialStore, RefreshTokenStore},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use uuid::Uuid;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, poisoned or not
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut records = write(&self.records)?;
        if records.contains_key(&record.token_hash) {
            return Err(AppError::Internal("duplicate refresh token".to_string()));
        }
        records.insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(read(&self.records)?.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError> {
        let mut records = write(&self.records)?;
        match records.get_mut(token_hash) {
            Some(record) if record.revoked_at.is_none() => {
                let now = Utc::now();
                record.revoked_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut records = write(&self.records)?;
        let now = Utc::now();
        let mut revoked = 0;
        for record in records
            .values_mut()
            .filter(|r| r.user_id == user_id && r.revoked_at.is_none())
        {
            record.revoked_at = Some(now);
            record.updated_at = now;
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<Uuid, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<Credential, AppError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == email) {
            return Err(AppError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let credential = Credential {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<Credential>, AppError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == email && u.id != user_id) {
            return Err(AppError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }

        Ok(users.get_mut(&user_id).map(|credential| {
            credential.email = email.to_string();
            credential.hashed_password = hashed_password.to_string();
            credential.updated_at = Utc::now();
            credential.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: Uuid, hash: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token_hash: hash.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_find_revoke() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        store.insert(&record(user_id, "h1")).await.unwrap();

        assert_eq!(store.find("h1").await.unwrap().unwrap().user_id, user_id);
        assert!(store.revoke("h1").await.unwrap());
        assert!(!store.revoke("h1").await.unwrap());
        assert!(!store.revoke("unknown").await.unwrap());
        assert!(store.find("h1").await.unwrap().unwrap().is_revoked());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_refused() {
        let store = InMemoryRefreshTokenStore::new();
        store.insert(&record(Uuid::new_v4(), "h1")).await.unwrap();
        assert!(store.insert(&record(Uuid::new_v4(), "h1")).await.is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_lock_keeps_count_and_fails_operations() {
        let store = std::sync::Arc::new(InMemoryRefreshTokenStore::new());
        store.insert(&record(Uuid::new_v4(), "h1")).await.unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(matches!(
            store.find("h1").await.unwrap_err(),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(&record(user_id, "a")).await.unwrap();
        store.insert(&record(user_id, "b")).await.unwrap();
        store.insert(&record(other, "c")).await.unwrap();

        assert_eq!(store.revoke_all_for_user(user_id).await.unwrap(), 2);
        assert_eq!(store.revoke_all_for_user(user_id).await.unwrap(), 0);
        assert!(!store.find("c").await.unwrap().unwrap().is_revoked());
    }

    #[tokio::test]
    async fn test_credentials_unique_email() {
        let store = InMemoryCredentialStore::new();
        let first = store.create("a@example.com", "h1").await.unwrap();
        store.create("b@example.com", "h2").await.unwrap();

        assert!(matches!(
            store.create("a@example.com", "h3").await.unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            store
                .update_credentials(first.id, "b@example.com", "h4")
                .await
                .unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_credential() {
        let store = InMemoryCredentialStore::new();
        let created = store.create("a@example.com", "old").await.unwrap();

        let updated = store
            .update_credentials(created.id, "new@example.com", "new")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.hashed_password, "new");
        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
        assert!(store
            .update_credentials(Uuid::new_v4(), "x@example.com", "h")
            .await
            .unwrap()
            .is_none());
    }
}
