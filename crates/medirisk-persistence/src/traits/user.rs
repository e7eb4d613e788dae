//! Account persistence trait

use async_trait::async_trait;

use crate::model::UserInfo;

/// Account storage operations
#[async_trait]
pub trait UserPersistence: Send + Sync {
    /// Find a user by email, ignoring case
    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>>;

    /// Find a user by id
    async fn user_find_by_id(&self, id: &str) -> anyhow::Result<Option<UserInfo>>;

    /// Create a new user
    ///
    /// Fails with `MediRiskError::Conflict` when the email is already taken.
    async fn user_create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> anyhow::Result<UserInfo>;
}
