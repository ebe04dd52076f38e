use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::predictions::{CreatePredictionCommand, UpdatePredictionCommand};
use crate::domain::models::prediction::{Prediction, PredictionValidationError};
use crate::storage::json::PredictionFileRepository;
use crate::storage::traits::PredictionStorage;

const MAX_NAME_LENGTH: usize = 100;

/// Result of applying a change to the in-memory collection
enum Mutation<T> {
    /// The collection changed and must be written back
    Changed(T),
    /// Nothing to write
    Unchanged(T),
}

/// Persistence facade over the prediction collection.
///
/// Every call pings the primary backend first. When the ping fails the
/// whole call is served by the file store. When it succeeds the call runs
/// against the primary and the resulting collection is mirrored into the
/// file store on a best-effort basis.
///
/// Mutations are unsynchronized read-modify-write cycles over the whole
/// collection: two concurrent writers race and the later write wins.
#[derive(Clone)]
pub struct PredictionService {
    primary: Arc<dyn PredictionStorage>,
    fallback: Arc<PredictionFileRepository>,
}

impl PredictionService {
    pub fn new(primary: Arc<dyn PredictionStorage>, fallback: Arc<PredictionFileRepository>) -> Self {
        Self { primary, fallback }
    }

    pub fn primary_backend_name(&self) -> &str {
        self.primary.backend_name()
    }

    pub async fn primary_reachable(&self) -> bool {
        self.primary.is_available().await
    }

    pub fn fallback_path(&self) -> &Path {
        self.fallback.data_file()
    }

    /// List every prediction in insertion order. Never fails: a broken
    /// primary degrades to the file store, which degrades to empty.
    pub async fn list_all(&self) -> Vec<Prediction> {
        if !self.primary.is_available().await {
            warn!("{} backend not reachable, reading from file storage", self.primary.backend_name());
            return self.fallback.load().await;
        }

        match self.primary.load_predictions().await {
            Ok(predictions) => {
                info!("Loaded {} predictions from {} backend", predictions.len(), self.primary.backend_name());
                predictions
            }
            Err(e) => {
                error!("Error fetching predictions: {:#}", e);
                self.fallback.load().await
            }
        }
    }

    /// Linear scan over `list_all`
    pub async fn get_by_id(&self, id: &str) -> Option<Prediction> {
        let prediction = self.list_all().await.into_iter().find(|p| p.id == id);
        if prediction.is_none() {
            warn!("Prediction not found: {}", id);
        }
        prediction
    }

    /// Create a prediction: assign an ID, fill defaults, append.
    ///
    /// If the primary path fails the record is appended to the file store
    /// instead. The primary error is returned only when that fails too.
    /// Whichever store takes the record, its ID is unique within that store.
    pub async fn save(&self, command: CreatePredictionCommand) -> Result<Prediction> {
        self.validate_create_command(&command)?;

        let prediction = Prediction::from_command(command, Utc::now());
        info!("Saving prediction {} for '{}'", prediction.id, prediction.name);

        if !self.primary.is_available().await {
            warn!("{} backend not reachable, using file storage fallback", self.primary.backend_name());
            let (saved, _) = Self::append_to(self.fallback.as_ref(), prediction).await?;
            return Ok(saved);
        }

        match Self::append_to(self.primary.as_ref(), prediction.clone()).await {
            Ok((saved, predictions)) => {
                self.mirror_to_fallback(&predictions).await;
                Ok(saved)
            }
            Err(primary_error) => {
                error!("Error saving prediction: {:#}", primary_error);
                match Self::append_to(self.fallback.as_ref(), prediction).await {
                    Ok((saved, _)) => {
                        warn!("Prediction {} saved to file storage only", saved.id);
                        Ok(saved)
                    }
                    Err(fallback_error) => {
                        error!("Fallback storage also failed: {:#}", fallback_error);
                        Err(primary_error)
                    }
                }
            }
        }
    }

    /// Append to one store, regenerating the ID while it collides with a
    /// stored record. Returns the saved record and the written collection.
    async fn append_to(
        store: &dyn PredictionStorage,
        mut prediction: Prediction,
    ) -> Result<(Prediction, Vec<Prediction>)> {
        let mut predictions = store.load_predictions().await?;

        while predictions.iter().any(|p| p.id == prediction.id) {
            prediction.id = Prediction::generate_id(Utc::now().timestamp_millis());
        }

        predictions.push(prediction.clone());
        store.replace_predictions(&predictions).await?;

        Ok((prediction, predictions))
    }

    /// Shallow-merge the command into the prediction with the given ID.
    /// Returns `None` without writing anything when the ID is unknown.
    pub async fn update(&self, id: &str, command: UpdatePredictionCommand) -> Result<Option<Prediction>> {
        self.validate_update_command(&command)?;
        info!("Updating prediction: {}", id);

        let updated = self
            .read_modify_write("update", |predictions| {
                match predictions.iter_mut().find(|p| p.id == id) {
                    Some(existing) => {
                        existing.apply_update(&command);
                        Mutation::Changed(Some(existing.clone()))
                    }
                    None => Mutation::Unchanged(None),
                }
            })
            .await?;

        if updated.is_none() {
            warn!("Prediction not found for update: {}", id);
        }
        Ok(updated)
    }

    /// Remove every prediction with the given ID. Unknown IDs are a no-op.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        info!("Deleting prediction: {}", id);

        let removed = self
            .read_modify_write("delete", |predictions| {
                let before = predictions.len();
                predictions.retain(|p| p.id != id);
                let removed = before - predictions.len();
                if removed > 0 {
                    Mutation::Changed(removed)
                } else {
                    Mutation::Unchanged(0)
                }
            })
            .await?;

        info!("Deleted {} prediction(s) with id {}", removed, id);
        Ok(())
    }

    /// Run a mutation on whichever backend is live; replay it on the file
    /// store if the primary fails mid-way.
    async fn read_modify_write<T, F>(&self, operation: &str, apply: F) -> Result<T>
    where
        T: Send,
        F: Fn(&mut Vec<Prediction>) -> Mutation<T> + Send + Sync,
    {
        if !self.primary.is_available().await {
            warn!(
                "{} backend not reachable, using file storage fallback for {}",
                self.primary.backend_name(),
                operation
            );
            let (result, _) = Self::apply_mutation(self.fallback.as_ref(), &apply).await?;
            return Ok(result);
        }

        match Self::apply_mutation(self.primary.as_ref(), &apply).await {
            Ok((result, written)) => {
                if let Some(predictions) = written {
                    self.mirror_to_fallback(&predictions).await;
                }
                Ok(result)
            }
            Err(primary_error) => {
                error!("Error during {} on {} backend: {:#}", operation, self.primary.backend_name(), primary_error);
                match Self::apply_mutation(self.fallback.as_ref(), &apply).await {
                    Ok((result, _)) => {
                        warn!("{} applied to file storage only", operation);
                        Ok(result)
                    }
                    Err(fallback_error) => {
                        error!("Fallback storage also failed during {}: {:#}", operation, fallback_error);
                        Err(primary_error)
                    }
                }
            }
        }
    }

    /// Returns the written collection when the mutation changed anything
    async fn apply_mutation<T, F>(
        store: &dyn PredictionStorage,
        apply: &F,
    ) -> Result<(T, Option<Vec<Prediction>>)>
    where
        T: Send,
        F: Fn(&mut Vec<Prediction>) -> Mutation<T> + Send + Sync,
    {
        let mut predictions = store.load_predictions().await?;
        match apply(&mut predictions) {
            Mutation::Changed(result) => {
                store.replace_predictions(&predictions).await?;
                Ok((result, Some(predictions)))
            }
            Mutation::Unchanged(result) => Ok((result, None)),
        }
    }

    /// Best effort: a failed mirror is logged, never surfaced
    async fn mirror_to_fallback(&self, predictions: &[Prediction]) {
        if let Err(e) = self.fallback.replace(predictions).await {
            warn!("Failed to mirror predictions to file storage: {:#}", e);
        }
    }

    fn validate_create_command(&self, command: &CreatePredictionCommand) -> Result<(), PredictionValidationError> {
        if let Some(name) = &command.name {
            Self::validate_name(name)?;
        }
        // blank values fall back to defaults, so only non-blank ones are checked
        if let Some(due_date) = command.due_date.as_deref().filter(|d| !d.trim().is_empty()) {
            Self::validate_due_date(due_date)?;
        }
        if let Some(timestamp) = command.timestamp.as_deref().filter(|t| !t.trim().is_empty()) {
            Self::validate_timestamp(timestamp)?;
        }
        Ok(())
    }

    fn validate_update_command(&self, command: &UpdatePredictionCommand) -> Result<(), PredictionValidationError> {
        if let Some(name) = &command.name {
            Self::validate_name(name)?;
        }
        if let Some(due_date) = &command.due_date {
            Self::validate_due_date(due_date)?;
        }
        if let Some(timestamp) = &command.timestamp {
            Self::validate_timestamp(timestamp)?;
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), PredictionValidationError> {
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(PredictionValidationError::NameTooLong { max: MAX_NAME_LENGTH });
        }
        Ok(())
    }

    fn validate_due_date(due_date: &str) -> Result<(), PredictionValidationError> {
        NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| PredictionValidationError::InvalidDueDate(due_date.to_string()))
    }

    fn validate_timestamp(timestamp: &str) -> Result<(), PredictionValidationError> {
        DateTime::parse_from_rfc3339(timestamp)
            .map(|_| ())
            .map_err(|_| PredictionValidationError::InvalidTimestamp(timestamp.to_string()))
    }
}
