//! Password hashing and verification using Argon2id

use crate::error::{AppError, AuthFailure};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, RngCore};

/// Salt length in bytes (the PHC recommended 16)
const SALT_LEN: usize = 16;

/// Argon2id hasher with a fixed cost.
///
/// Hashes are self-contained PHC strings (`$argon2id$v=19$m=...`), so the salt
/// and parameters travel with the hash.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Argon2id, m=19MiB, t=2, p=1 (OWASP minimum for Argon2id)
    pub fn new() -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::DEFAULT);

        Self { argon2 }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt_bytes).map_err(|e| {
            tracing::error!("Random source failed while salting password: {}", e);
            AppError::Hashing(format!("random source unavailable: {}", e))
        })?;

        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            tracing::error!("Failed to encode password salt: {}", e);
            AppError::Hashing(format!("salt encoding failed: {}", e))
        })?;

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                AppError::Hashing(format!("argon2 failed: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison inside argon2 is constant time. A hash that does
    /// not parse fails with `MalformedHash`, a wrong password with
    /// `PasswordMismatch`; both are `Unauthorized` to the caller.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::warn!("Stored password hash is malformed: {}", e);
            AppError::Unauthorized(AuthFailure::MalformedHash)
        })?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|e| match e {
                password_hash::Error::Password => {
                    AppError::Unauthorized(AuthFailure::PasswordMismatch)
                }
                other => {
                    tracing::warn!("Stored password hash is unusable: {}", other);
                    AppError::Unauthorized(AuthFailure::MalformedHash)
                }
            })
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash `password` with the default hasher
pub fn hash_password(password: &str) -> Result<String, AppError> {
    PasswordHasher::new().hash(password)
}

/// Verify `password` against `hash` with the default hasher
pub fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    PasswordHasher::new().verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "04234";

        let hash = hasher.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        hasher.verify(password, &hash).unwrap();
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("04234").unwrap();

        let err = hasher.verify("04235", &hash).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(AuthFailure::PasswordMismatch)));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = PasswordHasher::new();
        let password = "correct horse battery staple";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        assert_ne!(hash1, hash2);
        hasher.verify(password, &hash1).unwrap();
        hasher.verify(password, &hash2).unwrap();
    }

    #[test]
    fn test_malformed_hash_is_unauthorized() {
        let hasher = PasswordHasher::new();

        let err = hasher.verify("anything", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(AuthFailure::MalformedHash)));
        assert_eq!(err.user_message(), "Unauthorized");
    }

    #[test]
    fn test_empty_password_round_trips() {
        let hash = hash_password("").unwrap();
        verify_password("", &hash).unwrap();
        assert!(verify_password(" ", &hash).is_err());
    }
}
