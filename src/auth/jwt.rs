//! Access token issuance and validation
//!
//! Access tokens are HS256 JWTs that are never stored: validity is a function
//! of the MAC and the clock alone.

use crate::{
    config::SecurityConfig,
    error::{AppError, AuthFailure},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `iss` claim stamped on every access token
pub const ISSUER: &str = "chirpy";

/// The only algorithm tokens are signed or verified with. The token header is
/// never consulted to pick one.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Access token claims. Unknown fields are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub iss: String,
    /// User ID as a hyphenated UUID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and validates access tokens with one symmetric key.
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // expiry is compared against our own clock in `validate_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            config.jwt_secret.expose_secret(),
            config.access_token_ttl(),
        )
    }

    /// Configured lifetime in seconds
    pub fn expires_in(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    /// Issue a token for `user_id` valid from now for the configured TTL
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        if self.ttl <= Duration::zero() {
            return Err(AppError::Internal(
                "access token ttl must be positive".to_string(),
            ));
        }

        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::Internal("access token expiry is out of range".to_string())
        })?;

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.hyphenated().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate a token and return the user it was issued for
    pub fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        // a header that names an unknown algorithm (e.g. "none") is refused like
        // any other algorithm mismatch
        if let Err(e) = decode_header(token) {
            if matches!(e.kind(), JwtErrorKind::Json(_)) {
                tracing::debug!("Access token rejected: unusable header: {:?}", e);
                return Err(AppError::Unauthorized(AuthFailure::InvalidSignature));
            }
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {:?}", e);
                match e.kind() {
                    JwtErrorKind::InvalidSignature
                    | JwtErrorKind::InvalidAlgorithm
                    | JwtErrorKind::InvalidAlgorithmName
                    | JwtErrorKind::InvalidKeyFormat => {
                        AppError::Unauthorized(AuthFailure::InvalidSignature)
                    }
                    JwtErrorKind::ExpiredSignature => AppError::Unauthorized(AuthFailure::Expired),
                    _ => AppError::MalformedClaims(e.to_string()),
                }
            })?
            .claims;

        if now.timestamp() > claims.exp {
            tracing::debug!(exp = claims.exp, "Access token expired");
            return Err(AppError::Unauthorized(AuthFailure::Expired));
        }

        if claims.iat > claims.exp {
            return Err(AppError::MalformedClaims(
                "iat is later than exp".to_string(),
            ));
        }

        Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::MalformedClaims("sub is not a UUID".to_string()))
    }
}

/// Issue a single access token for `user_id` signed with `secret`
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    AccessTokenIssuer::new(secret, ttl).issue(user_id)
}

/// Validate `token` against `secret` and return its subject
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    AccessTokenIssuer::new(secret, Duration::hours(1)).validate(token)
}
