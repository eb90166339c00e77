//! Package revision repository.

use crate::error::MetadataResult;
use crate::models::PackageRevisionRow;
use async_trait::async_trait;

/// Repository for package revision history.
#[async_trait]
pub trait RevisionRepo: Send + Sync {
    /// Append a revision to a package's history and return its index.
    ///
    /// The index is computed inside the insert itself, so concurrent appends
    /// for one package serialize instead of colliding on the
    /// `(package_name, revision_index)` unique constraint. The input row's
    /// `revision_index` is ignored.
    async fn append_revision(&self, revision: &PackageRevisionRow) -> MetadataResult<i64>;

    /// List a package's revisions in history order.
    async fn list_revisions(&self, package_name: &str) -> MetadataResult<Vec<PackageRevisionRow>>;

    /// Most recent revision, if any.
    async fn latest_revision(
        &self,
        package_name: &str,
    ) -> MetadataResult<Option<PackageRevisionRow>>;
}
