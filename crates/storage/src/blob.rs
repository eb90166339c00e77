//! Content-addressed blob store layered over an [`ObjectStore`].
//!
//! Blobs are keyed by the SHA-256 of their content, so writes are
//! idempotent: storing the same bytes twice lands on the same key and the
//! second write is a no-op.

use crate::error::StorageResult;
use crate::traits::ObjectStore;
use bytes::Bytes;
use granary_core::BlobRef;
use std::sync::Arc;
use tracing::debug;

/// Result of storing a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Content-addressed reference to the stored bytes.
    pub blob_ref: BlobRef,
    /// Whether this call actually wrote the blob, as opposed to finding it
    /// already present under the same reference.
    pub was_new: bool,
}

/// Error from [`BlobStore::add_with`].
#[derive(Debug, thiserror::Error)]
pub enum AddWithError<E> {
    /// The derivation step rejected the content. Nothing was stored.
    #[error(transparent)]
    Transform(E),
    /// The derivation succeeded but persisting the blob failed.
    #[error(transparent)]
    Storage(#[from] crate::error::StorageError),
}

/// Content-addressed blob store.
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
}

impl BlobStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store `bytes` under their content hash.
    pub async fn add(&self, bytes: Bytes) -> StorageResult<StoredBlob> {
        let blob_ref = BlobRef::for_content(&bytes);
        let was_new = self
            .store
            .put_if_not_exists(&blob_ref.object_key(), bytes)
            .await?;
        debug!(blob = %blob_ref, was_new, "stored blob");
        Ok(StoredBlob { blob_ref, was_new })
    }

    /// Validate `bytes` with `transform`, then store them.
    ///
    /// The transform runs before anything touches storage: if it fails, no
    /// blob is written and the transform's error is returned unchanged.
    pub async fn add_with<T, E>(
        &self,
        bytes: Bytes,
        transform: impl FnOnce(&[u8]) -> Result<T, E>,
    ) -> Result<(StoredBlob, T), AddWithError<E>> {
        let derived = transform(&bytes).map_err(AddWithError::Transform)?;
        let stored = self.add(bytes).await?;
        Ok((stored, derived))
    }

    /// Fetch a blob by reference.
    pub async fn get(&self, blob_ref: &BlobRef) -> StorageResult<Bytes> {
        self.store.get(&blob_ref.object_key()).await
    }

    /// Remove a blob. Used to roll back a partially completed ingestion.
    pub async fn remove(&self, blob_ref: &BlobRef) -> StorageResult<()> {
        self.store.delete(&blob_ref.object_key()).await
    }

    /// Whether a blob with this reference is present.
    pub async fn contains(&self, blob_ref: &BlobRef) -> StorageResult<bool> {
        self.store.exists(&blob_ref.object_key()).await
    }
}
