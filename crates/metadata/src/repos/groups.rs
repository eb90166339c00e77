//! Group and membership repository.

use crate::error::MetadataResult;
use crate::models::{GroupMemberRow, GroupRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for group operations.
///
/// Membership writes are idempotent: adding an existing member or removing
/// an absent one succeeds without error.
#[async_trait]
pub trait GroupRepo: Send + Sync {
    /// Create a group if it does not already exist.
    async fn ensure_group(&self, group: &GroupRow) -> MetadataResult<()>;

    /// Get a group by name.
    async fn get_group(&self, group_name: &str) -> MetadataResult<Option<GroupRow>>;

    /// List members of a group, ordered by user ID.
    async fn group_members(&self, group_name: &str) -> MetadataResult<Vec<GroupMemberRow>>;

    /// Whether the user is currently a member of the group.
    async fn is_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<bool>;

    /// Add a member. A no-op if already present.
    async fn add_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<()>;

    /// Remove a member. A no-op if absent.
    async fn remove_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<()>;

    /// Replace the entire membership of a group in one transaction.
    async fn replace_group_members(
        &self,
        group_name: &str,
        user_ids: &[Uuid],
    ) -> MetadataResult<()>;
}
