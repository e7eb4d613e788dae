//! JWT token service

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::sync::Cache;
use rand::RngCore;
use tracing::{debug, warn};

use crate::model::{DEFAULT_TOKEN_EXPIRE_SECONDS, JwtClaims, TokenError};

/// Decode and validate JWT token without caching
pub fn decode_jwt_token(
    token: &str,
    secret_key: &str,
) -> jsonwebtoken::errors::Result<jsonwebtoken::TokenData<JwtClaims>> {
    let decoding_key = DecodingKey::from_base64_secret(secret_key)?;
    decode::<JwtClaims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
}

/// Encode a JWT token
pub fn encode_jwt_token(
    sub: &str,
    name: &str,
    secret_key: &str,
    expire_seconds: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(expire_seconds))
        .unwrap_or_else(chrono::Utc::now)
        .timestamp();

    let payload = JwtClaims {
        sub: sub.to_string(),
        name: name.to_string(),
        exp,
    };

    let encoding_key = EncodingKey::from_base64_secret(secret_key)?;
    encode(&Header::new(Algorithm::HS256), &payload, &encoding_key)
}

/// Random 256-bit secret, base64 encoded
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Issues, validates and revokes tokens
///
/// Decoded claims are cached for five minutes so repeated requests with the
/// same token skip signature checks. Revoked tokens are remembered for the
/// token lifetime, after which they would be rejected as expired anyway.
/// The revocation list has no size bound so eviction can never reinstate a
/// revoked token; entries only leave it by expiring.
pub struct TokenService {
    secret_key: String,
    expire_seconds: i64,
    token_cache: Cache<String, JwtClaims>,
    revoked: Cache<String, ()>,
}

impl TokenService {
    /// Build from a configured base64 secret, generating one when absent
    pub fn new(secret_key: Option<&str>, expire_seconds: i64) -> anyhow::Result<Self> {
        let secret_key = match secret_key.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => {
                // fail fast on a secret that cannot be used as an HMAC key
                EncodingKey::from_base64_secret(s)
                    .map_err(|e| anyhow::anyhow!("Invalid token secret key: {}", e))?;
                s.to_string()
            }
            None => {
                warn!("No token secret key configured, generated a random one; tokens will not survive a restart");
                generate_secret_key()
            }
        };
        let expire_seconds = if expire_seconds > 0 {
            expire_seconds
        } else {
            DEFAULT_TOKEN_EXPIRE_SECONDS
        };

        Ok(Self {
            secret_key,
            expire_seconds,
            token_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(300)) // 5 minutes TTL
                .build(),
            revoked: Cache::builder()
                .time_to_live(Duration::from_secs(expire_seconds as u64))
                .build(),
        })
    }

    pub fn expire_seconds(&self) -> i64 {
        self.expire_seconds
    }

    pub fn issue(&self, user_id: &str, name: &str) -> anyhow::Result<String> {
        encode_jwt_token(user_id, name, &self.secret_key, self.expire_seconds)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Decode and validate a token, consulting the revocation list first
    pub fn decode(&self, token: &str) -> Result<JwtClaims, TokenError> {
        if self.revoked.contains_key(token) {
            return Err(TokenError::Revoked);
        }

        if let Some(cached) = self.token_cache.get(token) {
            let now = chrono::Utc::now().timestamp();
            if cached.exp > now {
                return Ok(cached);
            }
            // Token expired in cache, invalidate it
            self.token_cache.invalidate(token);
        }

        let result = decode_jwt_token(token, &self.secret_key)?;
        self.token_cache
            .insert(token.to_string(), result.claims.clone());
        Ok(result.claims)
    }

    pub fn revoke(&self, token: &str) {
        self.token_cache.invalidate(token);
        self.revoked.insert(token.to_string(), ());
        debug!("Token revoked");
    }

    /// Clear the decoded token cache
    pub fn clear_cache(&self) {
        self.token_cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn test_secret_key() -> String {
        STANDARD.encode("test-secret-key-that-is-long-enough-for-hs256")
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let secret = test_secret_key();
        let token = encode_jwt_token("u-1", "Ana", &secret, 3600).unwrap();
        let data = decode_jwt_token(&token, &secret).unwrap();
        assert_eq!(data.claims.sub, "u-1");
        assert_eq!(data.claims.name, "Ana");
        assert!(data.claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let token = encode_jwt_token("u-1", "Ana", &test_secret_key(), 3600).unwrap();
        let other = STANDARD.encode("another-secret-key-that-is-long-enough");
        assert!(decode_jwt_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token() {
        let secret = test_secret_key();
        let token = encode_jwt_token("u-1", "Ana", &secret, -3600).unwrap();
        let err = decode_jwt_token(&token, &secret).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_service_issue_decode_and_revoke() {
        let service = TokenService::new(Some(&test_secret_key()), 600).unwrap();
        let token = service.issue("u-2", "Ben").unwrap();
        assert_eq!(service.decode(&token).unwrap().sub, "u-2");
        // second decode is served from the cache
        assert_eq!(service.decode(&token).unwrap().name, "Ben");

        service.revoke(&token);
        assert!(matches!(service.decode(&token), Err(TokenError::Revoked)));
    }

    #[test]
    fn test_revocation_survives_many_later_revocations() {
        let service = TokenService::new(Some(&test_secret_key()), 600).unwrap();
        let token = service.issue("u-3", "Cy").unwrap();
        service.revoke(&token);
        for i in 0..150_000 {
            service.revoke(&format!("logged-out-{i}"));
        }
        service.revoked.run_pending_tasks();

        assert_eq!(service.revoked.entry_count(), 150_001);
        assert!(matches!(service.decode(&token), Err(TokenError::Revoked)));
    }

    #[test]
    fn test_service_generates_secret() {
        let a = TokenService::new(None, 0).unwrap();
        assert_eq!(a.expire_seconds(), DEFAULT_TOKEN_EXPIRE_SECONDS);
        let b = TokenService::new(Some("   "), 60).unwrap();
        let token = a.issue("u", "U").unwrap();
        assert!(a.decode(&token).is_ok());
        assert!(b.decode(&token).is_err());
    }

    #[test]
    fn test_service_rejects_bad_secret() {
        assert!(TokenService::new(Some("not base64!!"), 60).is_err());
    }

    #[test]
    fn test_generate_secret_key_length() {
        let secret = generate_secret_key();
        assert_eq!(STANDARD.decode(secret).unwrap().len(), 32);
    }
}
