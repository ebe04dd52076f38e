use async_trait::async_trait;

use super::KvError;
use crate::storage::traits::KeyValueStore;

/// Stand-in primary used when no backend is configured. Every call fails,
/// which routes every operation to the file store.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredKeyValueStore;

#[async_trait]
impl KeyValueStore for UnconfiguredKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "none"
    }

    async fn ping(&self) -> Result<(), KvError> {
        Err(KvError::NotConfigured)
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::NotConfigured)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::NotConfigured)
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, KvError> {
        Err(KvError::NotConfigured)
    }
}
