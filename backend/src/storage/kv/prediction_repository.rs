use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::Prediction as SharedPrediction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::KvError;
use crate::domain::models::prediction::Prediction as DomainPrediction;
use crate::io::rest::mappers::prediction_mapper::PredictionMapper;
use crate::storage::traits::{KeyValueStore, PredictionStorage};

pub const DEFAULT_PREDICTIONS_KEY: &str = "predictions";

/// Keeps the whole prediction collection as one JSON array under a single key
#[derive(Clone)]
pub struct KvPredictionRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ping_timeout: Duration,
}

impl KvPredictionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, ping_timeout: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ping_timeout,
        }
    }
}

#[async_trait]
impl PredictionStorage for KvPredictionRepository {
    fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    async fn is_available(&self) -> bool {
        match tokio::time::timeout(self.ping_timeout, self.store.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(KvError::NotConfigured)) => {
                debug!("No primary backend configured");
                false
            }
            Ok(Err(e)) => {
                warn!("{} backend liveness check failed: {}", self.store.backend_name(), e);
                false
            }
            Err(_) => {
                warn!(
                    "{} backend liveness check timed out after {:?}",
                    self.store.backend_name(),
                    self.ping_timeout
                );
                false
            }
        }
    }

    async fn load_predictions(&self) -> Result<Vec<DomainPrediction>> {
        let raw = self
            .store
            .get(&self.key)
            .await
            .with_context(|| format!("Failed to read '{}' from {} backend", self.key, self.store.backend_name()))?;

        let Some(raw) = raw else {
            debug!("Key '{}' is not set, returning empty collection", self.key);
            return Ok(Vec::new());
        };

        match PredictionMapper::parse_collection(&raw) {
            Ok(predictions) => Ok(predictions),
            Err(e) => {
                warn!("Value under '{}' is not a prediction array ({}), treating as empty", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    async fn replace_predictions(&self, predictions: &[DomainPrediction]) -> Result<()> {
        let dtos: Vec<SharedPrediction> = predictions.iter().cloned().map(PredictionMapper::to_dto).collect();
        let raw = serde_json::to_string(&dtos)?;

        self.store
            .set(&self.key, &raw)
            .await
            .with_context(|| format!("Failed to write '{}' to {} backend", self.key, self.store.backend_name()))?;

        debug!("Wrote {} predictions to {} backend", predictions.len(), self.store.backend_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::predictions::CreatePredictionCommand;
    use crate::storage::kv::{MemoryKeyValueStore, UnconfiguredKeyValueStore};
    use crate::storage::test_utils::FlakyKeyValueStore;
    use chrono::Utc;
    use serde_json::json;
    use shared::Gender;

    fn repository_over(store: Arc<dyn KeyValueStore>) -> KvPredictionRepository {
        KvPredictionRepository::new(store, DEFAULT_PREDICTIONS_KEY, Duration::from_millis(200))
    }

    fn sample(name: &str) -> DomainPrediction {
        DomainPrediction::from_command(
            CreatePredictionCommand {
                name: Some(name.to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    /// Store whose ping never completes
    struct HangingKeyValueStore;

    #[async_trait]
    impl KeyValueStore for HangingKeyValueStore {
        fn backend_name(&self) -> &'static str {
            "hanging"
        }
        async fn ping(&self) -> Result<(), KvError> {
            std::future::pending().await
        }
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            std::future::pending().await
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
            std::future::pending().await
        }
        async fn keys(&self, _pattern: &str) -> Result<Vec<String>, KvError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_missing_key_loads_empty() {
        let repo = repository_over(Arc::new(MemoryKeyValueStore::new()));
        assert!(repo.load_predictions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_then_load_preserves_order_and_fields() {
        let repo = repository_over(Arc::new(MemoryKeyValueStore::new()));
        let mut first = sample("First");
        first.extra.insert("email".to_string(), json!("first@example.com"));
        let collection = vec![first, sample("Second"), sample("Third")];

        repo.replace_predictions(&collection).await.unwrap();

        assert_eq!(repo.load_predictions().await.unwrap(), collection);
    }

    #[tokio::test]
    async fn test_stored_value_uses_wire_format() {
        let store = MemoryKeyValueStore::new();
        let repo = repository_over(Arc::new(store.clone()));
        let prediction = sample("Ana");

        repo.replace_predictions(&[prediction.clone()]).await.unwrap();

        let raw = store.get(DEFAULT_PREDICTIONS_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], json!(prediction.id));
        assert_eq!(value[0]["dueDate"], json!(prediction.due_date));
        assert_eq!(value[0]["nameSuggestion"], json!(""));
        assert_eq!(value[0]["gender"], json!("boy"));
    }

    #[tokio::test]
    async fn test_malformed_value_loads_empty() {
        let store = MemoryKeyValueStore::new();
        store.set(DEFAULT_PREDICTIONS_KEY, "{not json").await.unwrap();
        let repo = repository_over(Arc::new(store.clone()));
        assert!(repo.load_predictions().await.unwrap().is_empty());

        store.set(DEFAULT_PREDICTIONS_KEY, r#"{"id":"x"}"#).await.unwrap();
        assert!(repo.load_predictions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_odd_record_keeps_the_rest_of_the_array() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                DEFAULT_PREDICTIONS_KEY,
                r#"[{"id":"a","name":"Ana","gender":"boy"},{"id":"b","name":"Bea","gender":"Girl","dueDate":null}]"#,
            )
            .await
            .unwrap();
        let repo = repository_over(Arc::new(store));

        let loaded = repo.load_predictions().await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, "b");
        assert_eq!(loaded[1].gender, Gender::Girl);
        assert_eq!(loaded[1].due_date, "");
    }

    #[tokio::test]
    async fn test_legacy_guess_field_becomes_gender() {
        let store = MemoryKeyValueStore::new();
        store
            .set(DEFAULT_PREDICTIONS_KEY, r#"[{"id":"old","name":"Bea","guess":"girl","timestamp":"2024-01-01T00:00:00Z"}]"#)
            .await
            .unwrap();
        let repo = repository_over(Arc::new(store));

        let loaded = repo.load_predictions().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].gender, Gender::Girl);
        assert!(!loaded[0].extra.contains_key("guess"));
    }

    #[tokio::test]
    async fn test_backend_read_error_propagates() {
        let store = FlakyKeyValueStore::new();
        store.fail_get(true);
        let repo = repository_over(Arc::new(store));
        assert!(repo.load_predictions().await.is_err());
    }

    #[tokio::test]
    async fn test_backend_write_error_propagates() {
        let store = FlakyKeyValueStore::new();
        store.fail_set(true);
        let repo = repository_over(Arc::new(store));
        assert!(repo.replace_predictions(&[sample("Ana")]).await.is_err());
    }

    #[tokio::test]
    async fn test_availability() {
        assert!(repository_over(Arc::new(MemoryKeyValueStore::new())).is_available().await);
        assert!(!repository_over(Arc::new(UnconfiguredKeyValueStore)).is_available().await);

        let flaky = FlakyKeyValueStore::new();
        flaky.fail_ping(true);
        assert!(!repository_over(Arc::new(flaky)).is_available().await);
    }

    #[tokio::test]
    async fn test_hanging_ping_times_out() {
        let repo = repository_over(Arc::new(HangingKeyValueStore));

        let started = std::time::Instant::now();
        assert!(!repo.is_available().await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
