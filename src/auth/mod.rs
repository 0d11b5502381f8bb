//! Authentication core: password hashing, access and refresh tokens,
//! credential extraction

pub mod api_key;
pub mod bearer;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;

pub use api_key::{validate_api_key, ApiKeyValidator};
pub use bearer::extract_bearer_token;
pub use jwt::{issue_access_token, validate_access_token, AccessTokenIssuer, Claims};
pub use middleware::{require_access_token, require_api_key, AuthContext};
pub use password::{hash_password, verify_password, PasswordHasher};
pub use refresh::RefreshTokenManager;
