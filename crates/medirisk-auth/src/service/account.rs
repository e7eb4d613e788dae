//! Account registration and login

use std::sync::Arc;

use tracing::info;

use medirisk_common::{MediRiskError, is_valid_email};
use medirisk_persistence::{PersistenceService, UserInfo};

use crate::model::{
    DEFAULT_BCRYPT_COST, FIELDS_REQUIRED_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
    INVALID_EMAIL_MESSAGE, LoginResult, MAX_PASSWORD_LENGTH, PASSWORD_TOO_LONG_MESSAGE,
};
use crate::service::auth::TokenService;

/// Account operations backed by the configured persistence service
pub struct AccountService {
    persistence: Arc<dyn PersistenceService>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
}

fn invalid_credentials() -> anyhow::Error {
    MediRiskError::AuthError(INVALID_CREDENTIALS_MESSAGE.to_string()).into()
}

impl AccountService {
    pub fn new(persistence: Arc<dyn PersistenceService>, tokens: Arc<TokenService>) -> Self {
        Self {
            persistence,
            tokens,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Override the bcrypt work factor, clamped to what bcrypt accepts
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost.clamp(4, 31);
        self
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn login_result(&self, user: &UserInfo) -> anyhow::Result<LoginResult> {
        Ok(LoginResult {
            token: self.tokens.issue(&user.id, &user.name)?,
            user_id: user.id.clone(),
            name: user.name.clone(),
            token_ttl: self.tokens.expire_seconds(),
        })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> anyhow::Result<LoginResult> {
        let (email, name) = (email.trim(), name.trim());
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(MediRiskError::IllegalArgument(FIELDS_REQUIRED_MESSAGE.to_string()).into());
        }
        if !is_valid_email(email) {
            return Err(MediRiskError::IllegalArgument(INVALID_EMAIL_MESSAGE.to_string()).into());
        }
        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(
                MediRiskError::IllegalArgument(PASSWORD_TOO_LONG_MESSAGE.to_string()).into(),
            );
        }

        let cost = self.bcrypt_cost;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await?
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

        let user = self
            .persistence
            .user_create(email, name, &password_hash)
            .await?;
        info!(user_id = %user.id, "Account registered");
        self.login_result(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<LoginResult> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(MediRiskError::IllegalArgument(FIELDS_REQUIRED_MESSAGE.to_string()).into());
        }

        let Some(user) = self.persistence.user_find_by_email(email).await? else {
            return Err(invalid_credentials());
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await?
            .unwrap_or(false);
        if !verified {
            return Err(invalid_credentials());
        }

        info!(user_id = %user.id, "Account signed in");
        self.login_result(&user)
    }

    /// Revoke `token`; unknown or already invalid tokens are ignored
    pub fn logout(&self, token: &str) {
        self.tokens.revoke(token);
    }

    /// Resolve the account behind a user id taken from a valid token
    pub async fn current_user(&self, user_id: &str) -> anyhow::Result<UserInfo> {
        self.persistence
            .user_find_by_id(user_id)
            .await?
            .ok_or_else(|| MediRiskError::AuthError("account no longer exists".to_string()).into())
    }
}
