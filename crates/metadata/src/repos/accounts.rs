//! Account and token repository.

use crate::error::MetadataResult;
use crate::models::{AccountRow, TokenRow};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for account and token operations.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Create an account.
    async fn create_account(&self, account: &AccountRow) -> MetadataResult<()>;

    /// Get an account by ID.
    async fn get_account(&self, user_id: Uuid) -> MetadataResult<Option<AccountRow>>;

    /// Get an account by username.
    async fn get_account_by_username(&self, username: &str) -> MetadataResult<Option<AccountRow>>;

    /// List all accounts.
    async fn list_accounts(&self) -> MetadataResult<Vec<AccountRow>>;

    /// Create a token.
    async fn create_token(&self, token: &TokenRow) -> MetadataResult<()>;

    /// Get a token by hash.
    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>>;

    /// Update last used time.
    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()>;

    /// Revoke a token.
    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()>;
}
