use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::Prediction as SharedPrediction;
use std::path::Path;
use tracing::{debug, warn};

use super::connection::JsonConnection;
use crate::domain::models::prediction::Prediction as DomainPrediction;
use crate::io::rest::mappers::prediction_mapper::PredictionMapper;
use crate::storage::traits::PredictionStorage;

/// Fallback store: the whole collection as one pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct PredictionFileRepository {
    connection: JsonConnection,
}

impl PredictionFileRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    pub fn data_file(&self) -> &Path {
        self.connection.data_file()
    }

    /// Load the collection. A missing document, or one that is not a JSON
    /// array, is an empty collection, never an error. Odd records inside a
    /// valid array are read leniently rather than discarding the document.
    pub async fn load(&self) -> Vec<DomainPrediction> {
        let path = self.connection.data_file();

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No fallback document at {}, returning empty collection", path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read fallback document {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match PredictionMapper::parse_collection(&content) {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!("Fallback document {} is malformed ({}), treating as empty", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Overwrite the document with the given collection
    pub async fn replace(&self, predictions: &[DomainPrediction]) -> Result<()> {
        self.connection.ensure_data_directory().await?;

        let dtos: Vec<SharedPrediction> = predictions.iter().cloned().map(PredictionMapper::to_dto).collect();
        let content = serde_json::to_string_pretty(&dtos)?;

        // Atomic write using temp file
        let path = self.connection.data_file();
        let temp_path = self.connection.temp_file();
        if let Err(e) = tokio::fs::write(&temp_path, content).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| format!("Failed to write {}", temp_path.display()));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        debug!("Saved {} predictions to {}", predictions.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl PredictionStorage for PredictionFileRepository {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn load_predictions(&self) -> Result<Vec<DomainPrediction>> {
        Ok(self.load().await)
    }

    async fn replace_predictions(&self, predictions: &[DomainPrediction]) -> Result<()> {
        self.replace(predictions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::predictions::CreatePredictionCommand;
    use crate::storage::test_utils::TestEnvironment;
    use chrono::Utc;
    use serde_json::json;
    use shared::Gender;

    fn sample(name: &str) -> DomainPrediction {
        DomainPrediction::from_command(
            CreatePredictionCommand {
                name: Some(name.to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_load_missing_document_is_empty() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();

        assert!(repo.load().await.is_empty());
        assert!(!repo.data_file().exists());
    }

    #[tokio::test]
    async fn test_replace_creates_directory_and_round_trips() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();
        assert!(!env.data_file.parent().unwrap().exists());

        let mut first = sample("First");
        first.extra.insert("email".to_string(), json!("first@example.com"));
        let collection = vec![first, sample("Second")];

        repo.replace(&collection).await.unwrap();

        assert!(env.data_file.exists());
        assert_eq!(repo.load().await, collection);
    }

    fn leftover_temp_files(env: &TestEnvironment) -> Vec<String> {
        std::fs::read_dir(env.data_file.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test]
    async fn test_replace_leaves_no_temp_file() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();

        repo.replace(&[sample("Ana")]).await.unwrap();

        assert!(leftover_temp_files(&env).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replaces_all_succeed() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();

        let writers: Vec<_> = (0..32)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.replace(&[sample(&format!("Writer {}", i))]).await })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().expect("every concurrent replace should succeed");
        }

        // last write wins: one complete document holding one writer's record
        let loaded = repo.load().await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].name.starts_with("Writer "));
        assert!(leftover_temp_files(&env).is_empty());
    }

    #[tokio::test]
    async fn test_document_is_pretty_printed_array() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();

        repo.replace(&[sample("Ana")]).await.unwrap();

        let content = std::fs::read_to_string(&env.data_file).unwrap();
        assert!(content.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["name"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_malformed_document_is_empty_and_gets_overwritten() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();
        std::fs::create_dir_all(env.data_file.parent().unwrap()).unwrap();
        std::fs::write(&env.data_file, "this is not json").unwrap();

        assert!(repo.load().await.is_empty());

        let saved = sample("Ana");
        repo.replace(&[saved.clone()]).await.unwrap();
        assert_eq!(repo.load().await, vec![saved]);
    }

    #[tokio::test]
    async fn test_non_array_document_is_empty() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();
        std::fs::create_dir_all(env.data_file.parent().unwrap()).unwrap();
        std::fs::write(&env.data_file, r#"{"id":"pred_1_abcdefg"}"#).unwrap();

        assert!(repo.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_odd_record_does_not_hide_the_others() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.file_repository();
        std::fs::create_dir_all(env.data_file.parent().unwrap()).unwrap();
        std::fs::write(
            &env.data_file,
            json!([
                { "id": "a", "name": "Ana", "gender": "girl", "dueDate": "2025-03-01" },
                { "id": "b", "name": null, "gender": "Girl", "dueDate": 20250301 },
                { "id": "c", "name": "Cy", "gender": "" }
            ])
            .to_string(),
        )
        .unwrap();

        let loaded = repo.load().await;

        let ids: Vec<&str> = loaded.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(loaded[1].name, "");
        assert_eq!(loaded[1].due_date, "20250301");
        assert_eq!(loaded[1].gender, Gender::Girl);
        assert_eq!(loaded[2].gender, Gender::Boy);
    }

    #[tokio::test]
    async fn test_replace_fails_when_directory_cannot_be_created() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = env.unwritable_file_repository();

        assert!(repo.replace(&[sample("Ana")]).await.is_err());
        assert!(repo.load().await.is_empty());
    }
}
