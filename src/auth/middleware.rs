//! Authentication middleware

use crate::{error::AppError, services::AuthService};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of the caller, attached to request extensions by
/// `require_access_token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| {
                AppError::Internal(
                    "AuthContext requested on a route without require_access_token".to_string(),
                )
            })
    }
}

/// Require a valid `Authorization: Bearer <access token>`
pub async fn require_access_token(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = auth_service.authenticate(req.headers())?;

    req.extensions_mut().insert(AuthContext { user_id });

    Ok(next.run(req).await)
}

/// Require the pre-shared `Authorization: ApiKey <key>`
pub async fn require_api_key(
    State(auth_service): State<Arc<AuthService>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    auth_service.authorize_webhook(req.headers())?;

    Ok(next.run(req).await)
}
