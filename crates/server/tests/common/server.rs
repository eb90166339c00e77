//! Server test utilities.

use async_trait::async_trait;
use bytes::Bytes;
use granary_core::PackageRevision;
use granary_core::config::{AdminConfig, AppConfig, MetadataConfig, ServerConfig, StorageConfig};
use granary_metadata::{MetadataStore, SqliteStore};
use granary_server::bootstrap::ensure_admin_token;
use granary_server::{AppState, DbMergeCoordinator, MergeCoordinator, MergeError, create_router};
use granary_storage::{FilesystemBackend, ObjectMeta, ObjectStore, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// The plaintext admin token matching `AdminConfig::for_testing()`.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Merge coordinator that records every accepted revision, with an optional
/// induced failure.
#[derive(Default)]
pub struct RecordingMerge {
    calls: Mutex<Vec<PackageRevision>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMerge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<PackageRevision> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MergeCoordinator for RecordingMerge {
    async fn merge_package(&self, revision: PackageRevision) -> Result<(), MergeError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(MergeError::new("induced merge failure"));
        }
        self.calls.lock().unwrap().push(revision);
        Ok(())
    }
}

/// Object store wrapper that fails writes once a budget is spent.
///
/// Reads and deletes always delegate. `put_if_not_exists` only charges the
/// budget for writes that would actually create an object, so deduplicated
/// puts never consume it.
pub struct FaultyBackend {
    inner: Arc<dyn ObjectStore>,
    write_budget: AtomicUsize,
}

#[allow(dead_code)]
impl FaultyBackend {
    pub fn new(inner: Arc<dyn ObjectStore>, write_budget: usize) -> Self {
        Self {
            inner,
            write_budget: AtomicUsize::new(write_budget),
        }
    }

    pub fn set_write_budget(&self, budget: usize) {
        self.write_budget.store(budget, Ordering::SeqCst);
    }

    fn take_write(&self) -> StorageResult<()> {
        let taken = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if taken {
            Ok(())
        } else {
            Err(StorageError::Io(std::io::Error::other(
                "injected write failure",
            )))
        }
    }
}

#[async_trait]
impl ObjectStore for FaultyBackend {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.take_write()?;
        self.inner.put(key, data).await
    }

    async fn put_if_not_exists(&self, key: &str, data: Bytes) -> StorageResult<bool> {
        if self.inner.exists(key).await? {
            return Ok(false);
        }
        self.take_write()?;
        self.inner.put_if_not_exists(key, data).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

/// Knobs for building a test server.
#[derive(Default)]
struct TestOptions {
    merge: Option<Arc<RecordingMerge>>,
    write_budget: Option<usize>,
    max_body_size: Option<usize>,
}

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with the production merge coordinator.
    pub async fn new() -> Self {
        Self::build(TestOptions::default()).await.0
    }

    /// Create a test server whose merge coordinator records invocations.
    pub async fn with_recording_merge() -> (Self, Arc<RecordingMerge>) {
        let merge = RecordingMerge::new();
        let server = Self::build(TestOptions {
            merge: Some(merge.clone()),
            ..TestOptions::default()
        })
        .await
        .0;
        (server, merge)
    }

    /// Create a test server whose object store fails after `budget` writes.
    pub async fn with_write_budget(budget: usize) -> (Self, Arc<FaultyBackend>) {
        let (server, backend) = Self::build(TestOptions {
            write_budget: Some(budget),
            ..TestOptions::default()
        })
        .await;
        (server, backend.expect("faulty backend requested"))
    }

    /// Create a test server with a custom request body limit.
    pub async fn with_max_body_size(max_body_size: usize) -> Self {
        Self::build(TestOptions {
            max_body_size: Some(max_body_size),
            ..TestOptions::default()
        })
        .await
        .0
    }

    async fn build(options: TestOptions) -> (Self, Option<Arc<FaultyBackend>>) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let storage_path = temp_dir.path().join("storage");
        std::fs::create_dir_all(&storage_path).expect("Failed to create storage directory");
        let filesystem: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );
        let faulty = options
            .write_budget
            .map(|budget| Arc::new(FaultyBackend::new(filesystem.clone(), budget)));
        let storage: Arc<dyn ObjectStore> = match &faulty {
            Some(backend) => backend.clone(),
            None => filesystem,
        };

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut server_config = ServerConfig::default();
        if let Some(limit) = options.max_body_size {
            server_config.max_body_size = limit;
        }

        let config = AppConfig {
            server: server_config,
            storage: StorageConfig::Filesystem {
                path: storage_path,
            },
            metadata: MetadataConfig::Sqlite { path: db_path },
            admin: AdminConfig::for_testing(),
        };

        ensure_admin_token(metadata.as_ref(), &config.admin)
            .await
            .expect("Failed to bootstrap admin token");

        let merge: Arc<dyn MergeCoordinator> = match options.merge {
            Some(recording) => recording,
            None => Arc::new(DbMergeCoordinator::new(metadata.clone())),
        };

        let state = AppState::new(config, storage, metadata, merge);
        let router = create_router(state.clone());

        (
            Self {
                router,
                state,
                _temp_dir: temp_dir,
            },
            faulty,
        )
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }
}
