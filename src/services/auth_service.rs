//! Authentication service: signup, login, refresh, revoke

use crate::{
    auth::{
        bearer::extract_bearer_token, AccessTokenIssuer, ApiKeyValidator, PasswordHasher,
        RefreshTokenManager,
    },
    config::SecurityConfig,
    error::{AppError, AuthFailure},
    models::{
        auth::{LoginRequest, LoginResponse, RefreshResponse},
        user::{RegisterRequest, UpdateCredentialsRequest, UserResponse},
    },
    repository::{CredentialStore, RefreshTokenStore},
};
use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

/// Well-formed Argon2id hash no password maps to. Verified against when the
/// email is unknown so both paths cost one hash computation.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: RefreshTokenManager,
    access_tokens: AccessTokenIssuer,
    hasher: PasswordHasher,
    api_key: ApiKeyValidator,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        config: &SecurityConfig,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens: RefreshTokenManager::new(refresh_store, config.refresh_token_ttl()),
            access_tokens: AccessTokenIssuer::from_config(config),
            hasher: PasswordHasher::new(),
            api_key: ApiKeyValidator::new(&config.api_key),
        }
    }

    pub fn access_tokens(&self) -> &AccessTokenIssuer {
        &self.access_tokens
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager {
        &self.refresh_tokens
    }

    /// Create a credential for a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        if req.email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }

        let hashed_password = self.hasher.hash(&req.password)?;
        let credential = self.credentials.create(&req.email, &hashed_password).await?;

        tracing::info!(user_id = %credential.id, "User registered");
        Ok(UserResponse::from(credential))
    }

    /// Verify credentials and mint an access token plus a refresh token
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let credential = match self.credentials.find_by_email(&req.email).await? {
            Some(credential) => credential,
            None => {
                let _ = self.hasher.verify(&req.password, DUMMY_HASH);
                tracing::info!("Login failed: unknown email");
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                return Err(AppError::Unauthorized(AuthFailure::InvalidCredentials));
            }
        };

        if let Err(e) = self.hasher.verify(&req.password, &credential.hashed_password) {
            tracing::info!(user_id = %credential.id, reason = ?e, "Login failed");
            metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
            return Err(match e {
                AppError::Unauthorized(_) => {
                    AppError::Unauthorized(AuthFailure::InvalidCredentials)
                }
                other => other,
            });
        }

        let access_token = self.access_tokens.issue(credential.id)?;
        let refresh_token = self.refresh_tokens.create(credential.id).await?;

        tracing::info!(user_id = %credential.id, "Login succeeded");
        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);

        Ok(LoginResponse {
            access_token,
            refresh_token,
            expires_in: self.access_tokens.expires_in(),
            user: UserResponse::from(credential),
        })
    }

    /// Exchange the bearer refresh token for a new access token.
    /// The refresh token itself stays valid.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<RefreshResponse, AppError> {
        let refresh_token = extract_bearer_token(headers)?;

        let user_id = match self.refresh_tokens.lookup(&refresh_token).await {
            Ok(user_id) => user_id,
            Err(e) => {
                metrics::counter!("auth_refresh_total", "outcome" => "failure").increment(1);
                return Err(e);
            }
        };

        let access_token = self.access_tokens.issue(user_id)?;
        metrics::counter!("auth_refresh_total", "outcome" => "success").increment(1);
        tracing::debug!(user_id = %user_id, "Access token refreshed");

        Ok(RefreshResponse {
            access_token,
            expires_in: self.access_tokens.expires_in(),
        })
    }

    /// Revoke the bearer refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let refresh_token = extract_bearer_token(headers)?;
        self.refresh_tokens.revoke(&refresh_token).await
    }

    /// Revoke every refresh token of the caller identified by the bearer
    /// access token
    pub async fn logout_all(&self, headers: &HeaderMap) -> Result<u64, AppError> {
        let user_id = self.authenticate(headers)?;
        self.refresh_tokens.revoke_all_for_user(user_id).await
    }

    /// Validate the bearer access token and return the caller's user ID
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AppError> {
        let access_token = extract_bearer_token(headers)?;
        self.access_tokens.validate(&access_token)
    }

    /// Replace the caller's email and password
    pub async fn update_credentials(
        &self,
        headers: &HeaderMap,
        req: UpdateCredentialsRequest,
    ) -> Result<UserResponse, AppError> {
        let user_id = self.authenticate(headers)?;

        if req.email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }

        let hashed_password = self.hasher.hash(&req.password)?;
        let credential = self
            .credentials
            .update_credentials(user_id, &req.email, &hashed_password)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "Credential update for a missing user");
                AppError::Unauthorized(AuthFailure::InvalidCredentials)
            })?;

        tracing::info!(user_id = %user_id, "Credentials updated");
        Ok(UserResponse::from(credential))
    }

    /// Check the pre-shared key of a webhook caller
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> Result<(), AppError> {
        self.api_key.validate(headers)
    }
}
