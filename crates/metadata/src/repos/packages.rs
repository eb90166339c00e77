//! Package repository.

use crate::error::MetadataResult;
use crate::models::PackageRow;
use async_trait::async_trait;

/// Repository for package records.
#[async_trait]
pub trait PackageRepo: Send + Sync {
    /// Create a package.
    async fn create_package(&self, package: &PackageRow) -> MetadataResult<()>;

    /// Get a package by name.
    async fn get_package(&self, package_name: &str) -> MetadataResult<Option<PackageRow>>;

    /// Whether a package with this name exists.
    async fn package_exists(&self, package_name: &str) -> MetadataResult<bool>;

    /// List all packages, ordered by name.
    async fn list_packages(&self) -> MetadataResult<Vec<PackageRow>>;
}
