mod common;

use bytes::Bytes;
use common::memory::MemoryBackend;
use granary_storage::{AddWithError, BlobStore};
use std::sync::Arc;

fn setup() -> (Arc<MemoryBackend>, BlobStore) {
    let backend = Arc::new(MemoryBackend::new());
    let blobs = BlobStore::new(backend.clone());
    (backend, blobs)
}

#[tokio::test]
async fn add_is_content_addressed_and_idempotent() {
    let (_backend, blobs) = setup();

    let first = blobs.add(Bytes::from_static(b"same content")).await.unwrap();
    let second = blobs.add(Bytes::from_static(b"same content")).await.unwrap();

    assert_eq!(first.blob_ref, second.blob_ref);
    assert!(first.was_new);
    assert!(!second.was_new);
}

#[tokio::test]
async fn distinct_content_gets_distinct_refs() {
    let (backend, blobs) = setup();

    let a = blobs.add(Bytes::from_static(b"alpha")).await.unwrap();
    let b = blobs.add(Bytes::from_static(b"beta")).await.unwrap();

    assert_ne!(a.blob_ref, b.blob_ref);
    assert_eq!(backend.keys().len(), 2);
}

#[tokio::test]
async fn get_returns_stored_bytes() {
    let (_backend, blobs) = setup();

    let stored = blobs.add(Bytes::from_static(b"payload")).await.unwrap();
    let data = blobs.get(&stored.blob_ref).await.unwrap();
    assert_eq!(data.as_ref(), b"payload");
}

#[tokio::test]
async fn add_with_stores_nothing_when_transform_fails() {
    let (backend, blobs) = setup();

    let result = blobs
        .add_with(Bytes::from_static(b"bad bytes"), |_| {
            Err::<(), _>("rejected")
        })
        .await;

    match result {
        Err(AddWithError::Transform(msg)) => assert_eq!(msg, "rejected"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(backend.keys().is_empty());
}

#[tokio::test]
async fn add_with_returns_derived_value_on_success() {
    let (_backend, blobs) = setup();

    let (stored, len) = blobs
        .add_with(Bytes::from_static(b"measure me"), |raw| {
            Ok::<_, std::convert::Infallible>(raw.len())
        })
        .await
        .unwrap();

    assert_eq!(len, 10);
    assert!(blobs.contains(&stored.blob_ref).await.unwrap());
}

#[tokio::test]
async fn remove_deletes_the_blob() {
    let (backend, blobs) = setup();

    let stored = blobs.add(Bytes::from_static(b"transient")).await.unwrap();
    blobs.remove(&stored.blob_ref).await.unwrap();

    assert!(!blobs.contains(&stored.blob_ref).await.unwrap());
    assert!(backend.keys().is_empty());
}
