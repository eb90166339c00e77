//! Application state shared across handlers.

use crate::merge::MergeCoordinator;
use granary_core::config::AppConfig;
use granary_metadata::MetadataStore;
use granary_storage::{BlobStore, ObjectStore};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Content-addressed blob store over the storage backend.
    pub blobs: BlobStore,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Merge coordinator for accepted revisions.
    pub merge: Arc<dyn MergeCoordinator>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        merge: Arc<dyn MergeCoordinator>,
    ) -> Self {
        let blobs = BlobStore::new(storage.clone());
        Self {
            config: Arc::new(config),
            storage,
            blobs,
            metadata,
            merge,
        }
    }
}
