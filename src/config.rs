//! Configuration
//! Loaded once from environment variables; secrets are wrapped in `Secret`.

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// Default access token lifetime: one hour.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;
/// Default refresh token lifetime: 60 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 60 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (wrapped in Secret so it never reaches the logs)
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key for access tokens
    pub jwt_secret: Secret<String>,
    /// Pre-shared key for webhook callers
    pub api_key: Secret<String>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

impl SecurityConfig {
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_secs as i64)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl_secs as i64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Load configuration from `CHIRP_`-prefixed environment variables.
    ///
    /// Sections are separated with `__`, e.g. `CHIRP_SECURITY__JWT_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.api_key", "")?
            .set_default("security.access_token_ttl_secs", DEFAULT_ACCESS_TOKEN_TTL_SECS)?
            .set_default("security.refresh_token_ttl_secs", DEFAULT_REFRESH_TOKEN_TTL_SECS)?
            .add_source(
                Environment::with_prefix("CHIRP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = settings.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // HS256 keys shorter than the digest weaken the MAC
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.security.access_token_ttl_secs == 0 || self.security.access_token_ttl_secs > 86400
        {
            return Err(ConfigError::Message(
                "access_token_ttl_secs must be between 1 and 86400 (up to 24 hours)".to_string(),
            ));
        }

        if self.security.refresh_token_ttl_secs < 3600
            || self.security.refresh_token_ttl_secs > 31_536_000
        {
            return Err(ConfigError::Message(
                "refresh_token_ttl_secs must be between 3600 and 31536000 (1 hour to 365 days)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
