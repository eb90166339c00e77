//! Object storage abstraction and backends for granary.
//!
//! This crate provides:
//! - The `ObjectStore` trait with atomic writes
//! - A local filesystem backend
//! - The content-addressable `BlobStore` used by the tarball ingestion path

pub mod backends;
pub mod blob;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use blob::{AddWithError, BlobStore, StoredBlob};
pub use error::{StorageError, StorageResult};
pub use traits::{ObjectMeta, ObjectStore};

use granary_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
