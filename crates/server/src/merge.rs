//! Merge coordination: handing an accepted revision to the repository index.

use async_trait::async_trait;
use granary_core::PackageRevision;
use granary_metadata::{GroupRow, MetadataStore, PackageRevisionRow};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

/// Opaque merge failure. The coordinator owns the detail; callers only need
/// to know the revision was not accepted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MergeError {
    message: String,
}

impl MergeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Accepts fully validated revisions into the repository.
///
/// Invoked exactly once per successful ingestion, after all content is
/// persisted. A merge failure fails the whole request.
#[async_trait]
pub trait MergeCoordinator: Send + Sync {
    async fn merge_package(&self, revision: PackageRevision) -> Result<(), MergeError>;
}

/// Per-package maintainer group name.
pub fn maintainers_group(package_name: &str) -> String {
    format!("pkg-maintainers-{package_name}")
}

/// Merge coordinator backed by the metadata store.
///
/// Appends the revision to the package's history and records the uploader
/// as a maintainer of the package.
pub struct DbMergeCoordinator {
    metadata: Arc<dyn MetadataStore>,
}

impl DbMergeCoordinator {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl MergeCoordinator for DbMergeCoordinator {
    async fn merge_package(&self, revision: PackageRevision) -> Result<(), MergeError> {
        let package_name = revision.id.name().to_string();
        let version = revision.id.version().to_string();

        let (compressed_ref, decompressed_ref) = match &revision.tarball {
            Some(tarball) => (
                Some(tarball.compressed.to_string()),
                Some(tarball.decompressed.to_string()),
            ),
            None => (None, None),
        };

        let row = PackageRevisionRow {
            revision_id: Uuid::new_v4(),
            package_name: package_name.clone(),
            version: version.clone(),
            // Assigned by the store on insert.
            revision_index: 0,
            descriptor_raw: revision.descriptor_raw.to_vec(),
            tarball_compressed_ref: compressed_ref,
            tarball_decompressed_ref: decompressed_ref,
            uploaded_at: revision.provenance.at,
            uploader_id: *revision.provenance.uploader.as_uuid(),
        };

        let revision_index = self
            .metadata
            .append_revision(&row)
            .await
            .map_err(|e| MergeError::new(format!("revision append failed: {e}")))?;

        let group = maintainers_group(&package_name);
        self.metadata
            .ensure_group(&GroupRow {
                group_name: group.clone(),
                title: format!("Maintainers of {package_name}"),
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .map_err(|e| MergeError::new(format!("maintainer group creation failed: {e}")))?;
        self.metadata
            .add_group_member(&group, *revision.provenance.uploader.as_uuid())
            .await
            .map_err(|e| MergeError::new(format!("maintainer registration failed: {e}")))?;

        info!(
            package = %package_name,
            version = %version,
            revision_index,
            uploader = %revision.provenance.uploader,
            "revision merged"
        );
        Ok(())
    }
}
