//! Test utilities: temp-dir environments and key-value stores with
//! injectable failures.
//!
//! The temporary directory lives as long as the `TestEnvironment`, so test
//! data is removed even when a test panics.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Barrier;

use crate::config::AppConfig;
use crate::domain::PredictionService;
use crate::storage::json::{JsonConnection, PredictionFileRepository};
use crate::storage::kv::{KvError, KvPredictionRepository, MemoryKeyValueStore, DEFAULT_PREDICTIONS_KEY};
use crate::storage::traits::KeyValueStore;
use crate::AppState;

pub const TEST_PING_TIMEOUT: Duration = Duration::from_millis(200);

pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub base_path: PathBuf,
    /// Fallback document path; its directory does not exist yet
    pub data_file: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let data_file = base_path.join("data").join("predictions.json");

        Ok(Self {
            _temp_dir: temp_dir,
            base_path,
            data_file,
        })
    }

    pub fn file_repository(&self) -> PredictionFileRepository {
        PredictionFileRepository::new(JsonConnection::new(&self.data_file))
    }

    /// A file repository whose directory can never be created because a
    /// regular file sits where the directory should be
    pub fn unwritable_file_repository(&self) -> PredictionFileRepository {
        let blocker = self.base_path.join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("Failed to create blocker file");
        PredictionFileRepository::new(JsonConnection::new(blocker.join("predictions.json")))
    }

    pub fn service_with(&self, store: Arc<dyn KeyValueStore>) -> PredictionService {
        self.service_with_fallback(store, self.file_repository())
    }

    pub fn service_with_fallback(
        &self,
        store: Arc<dyn KeyValueStore>,
        fallback: PredictionFileRepository,
    ) -> PredictionService {
        let primary = KvPredictionRepository::new(store, DEFAULT_PREDICTIONS_KEY, TEST_PING_TIMEOUT);
        PredictionService::new(Arc::new(primary), Arc::new(fallback))
    }

    /// Handler state over the given primary store and default configuration
    pub fn app_state(&self, store: Arc<dyn KeyValueStore>) -> AppState {
        let config = AppConfig::from_lookup(|_| None).expect("Default configuration is valid");
        AppState {
            prediction_service: self.service_with(store.clone()),
            kv_store: store,
            config: Arc::new(config),
        }
    }
}

/// Memory store whose operations can be switched to fail
#[derive(Clone, Default)]
pub struct FlakyKeyValueStore {
    pub inner: MemoryKeyValueStore,
    fail_ping: Arc<AtomicBool>,
    fail_get: Arc<AtomicBool>,
    fail_set: Arc<AtomicBool>,
}

impl FlakyKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), KvError> {
        if flag.load(Ordering::SeqCst) {
            Err(KvError::Backend(format!("injected {} failure", operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> Result<(), KvError> {
        Self::check(&self.fail_ping, "ping")
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Self::check(&self.fail_get, "get")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        Self::check(&self.fail_set, "set")?;
        self.inner.set(key, value).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        self.inner.keys(pattern).await
    }
}

/// Memory store that holds the first `readers` reads at a barrier until all
/// of them have read, forcing concurrent read-modify-write cycles to
/// interleave.
#[derive(Clone)]
pub struct InterleavingKeyValueStore {
    pub inner: MemoryKeyValueStore,
    barrier: Arc<Barrier>,
    remaining: Arc<AtomicUsize>,
}

impl InterleavingKeyValueStore {
    pub fn new(readers: usize) -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            barrier: Arc::new(Barrier::new(readers)),
            remaining: Arc::new(AtomicUsize::new(readers)),
        }
    }
}

#[async_trait]
impl KeyValueStore for InterleavingKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "interleaving"
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let value = self.inner.get(key).await?;
        let held = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if held {
            self.barrier.wait().await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.inner.set(key, value).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        self.inner.keys(pattern).await
    }
}
