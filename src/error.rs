//! Unified error model
//! Every public operation returns `AppError`; the three error kinds map onto
//! 401 / 400 / 500 and never leak internal detail to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Why an authentication attempt was refused.
///
/// Only visible in-process and in logs; every variant renders as the same
/// "Unauthorized" message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown account, wrong password or unusable stored hash (login level)
    InvalidCredentials,
    PasswordMismatch,
    /// Stored hash is not a PHC string the hasher understands
    MalformedHash,
    InvalidSignature,
    Expired,
    /// Refresh token unknown, revoked or expired
    RefreshTokenRejected,
    ApiKeyMismatch,
}

/// Coarse classification used for status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationFailure,
    MalformedInput,
    InternalFailure,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized(AuthFailure),

    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Malformed token claims: {0}")]
    MalformedClaims(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::AuthenticationFailure,
            AppError::MissingHeader(_)
            | AppError::MalformedHeader
            | AppError::MalformedClaims(_)
            | AppError::BadRequest(_) => ErrorKind::MalformedInput,
            AppError::Database(_)
            | AppError::Hashing(_)
            | AppError::Config(_)
            | AppError::Internal(_) => ErrorKind::InternalFailure,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
            ErrorKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller (no store, hashing or token detail)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized(_) => "Unauthorized".to_string(),
            AppError::MissingHeader(header) => format!("Missing {} header", header),
            AppError::MalformedHeader => "Malformed authorization header".to_string(),
            AppError::MalformedClaims(_) => "Malformed token".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Hashing(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        match (&self, self.kind()) {
            (AppError::Unauthorized(reason), _) => tracing::warn!(
                code = self.code(),
                reason = ?reason,
                request_id = %request_id,
                "Authentication failed"
            ),
            (_, ErrorKind::MalformedInput) => tracing::warn!(
                code = self.code(),
                message = %self,
                request_id = %request_id,
                "Client error"
            ),
            _ => tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %request_id,
                "Application error"
            ),
        }

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}
