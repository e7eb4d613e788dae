//! Authentication models
//!
//! This file defines data structures for accounts, login results and JWT tokens

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use medirisk_persistence::UserInfo;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const TOKEN_PREFIX: &str = "Bearer ";
pub const ACCESS_TOKEN: &str = "accessToken";
pub const DEFAULT_TOKEN_EXPIRE_SECONDS: i64 = 18000;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const MAX_PASSWORD_LENGTH: usize = 72;

pub const FIELDS_REQUIRED_MESSAGE: &str = "All fields are required";
pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email address";
pub const PASSWORD_TOO_LONG_MESSAGE: &str = "Password must be at most 72 bytes";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect email or password";

/// JWT payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: String,
    pub name: String,
    pub exp: i64,
}

/// Why a presented token was not accepted
#[derive(thiserror::Error, Debug, Clone)]
pub enum TokenError {
    #[error("token revoked")]
    Revoked,

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Auth context passed through request extensions
#[derive(Debug, Default, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub name: String,
    pub token: Option<String>,
    pub jwt_error: Option<TokenError>,
    pub token_provided: bool,
}

impl AuthContext {
    /// Whether the request carried a valid token
    pub fn is_authenticated(&self) -> bool {
        self.token_provided && self.jwt_error.is_none() && !self.user_id.is_empty()
    }

    /// The caller's user id when authenticated
    pub fn user_id(&self) -> Option<&str> {
        self.is_authenticated().then_some(self.user_id.as_str())
    }

    pub fn jwt_error_string(&self) -> String {
        match &self.jwt_error {
            Some(TokenError::Jwt(e)) => match e.kind() {
                ErrorKind::ExpiredSignature => "token expired!".to_string(),
                _ => e.to_string(),
            },
            Some(TokenError::Revoked) => TokenError::Revoked.to_string(),
            None => String::default(),
        }
    }
}

/// Returned by register and login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub token_ttl: i64,
}

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserInfo> for AccountInfo {
    fn from(value: UserInfo) -> Self {
        Self {
            id: value.id,
            email: value.email,
            name: value.name,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_constants() {
        assert_eq!(AUTHORIZATION_HEADER, "Authorization");
        assert_eq!(TOKEN_PREFIX, "Bearer ");
        assert_eq!(DEFAULT_TOKEN_EXPIRE_SECONDS, 18000);
        assert_eq!(MAX_PASSWORD_LENGTH, 72);
    }

    #[test]
    fn test_auth_context_default() {
        let ctx = AuthContext::default();
        assert!(ctx.user_id.is_empty());
        assert!(ctx.jwt_error.is_none());
        assert!(!ctx.token_provided);
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.jwt_error_string(), "");
    }

    #[test]
    fn test_auth_context_revoked() {
        let ctx = AuthContext {
            user_id: "u-1".to_string(),
            token_provided: true,
            jwt_error: Some(TokenError::Revoked),
            ..Default::default()
        };
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user_id(), None);
        assert_eq!(ctx.jwt_error_string(), "token revoked");
    }

    #[test]
    fn test_auth_context_authenticated() {
        let ctx = AuthContext {
            user_id: "u-1".to_string(),
            name: "Ana".to_string(),
            token_provided: true,
            ..Default::default()
        };
        assert_eq!(ctx.user_id(), Some("u-1"));
    }

    #[test]
    fn test_account_info_hides_hash() {
        let user = UserInfo::new("a@b.co", "A", "$2b$secret");
        let value = serde_json::to_value(AccountInfo::from(user)).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "a@b.co");
    }
}
