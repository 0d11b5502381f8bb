//! `Authorization` header parsing

use crate::error::AppError;
use axum::http::{header::AUTHORIZATION, HeaderMap};

pub const BEARER_SCHEME: &str = "Bearer";

/// Extract the credential from an `Authorization: <scheme> <credential>` header.
///
/// The value must split on single spaces into exactly two parts, the first
/// equal to `scheme` (case-sensitive) and the second non-empty.
pub(crate) fn extract_credential<'a>(
    headers: &'a HeaderMap,
    scheme: &str,
) -> Result<&'a str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingHeader("Authorization"))?
        .to_str()
        .map_err(|_| AppError::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(found), Some(credential), None) if found == scheme && !credential.is_empty() => {
            Ok(credential)
        }
        _ => Err(AppError::MalformedHeader),
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    extract_credential(headers, BEARER_SCHEME).map(str::to_string)
}
