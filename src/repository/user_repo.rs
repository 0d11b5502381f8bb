//! User credential persistence in PostgreSQL

use crate::{error::AppError, models::user::Credential, repository::CredentialStore};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("Email is already registered".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<Credential, AppError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(credential)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, email, hashed_password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(credential)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<Credential>, AppError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(hashed_password)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(credential)
    }
}
