//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::prediction::Prediction;
use crate::storage::kv::KvError;

/// Trait defining the interface for prediction collection storage
///
/// The whole collection is one unit: it is always loaded and written back in
/// full. Both the key-value repository and the JSON file repository implement
/// this trait, and the domain layer picks one per call.
#[async_trait]
pub trait PredictionStorage: Send + Sync {
    /// Short name used in logs and diagnostics
    fn backend_name(&self) -> &str;

    /// Liveness check. Must return within a bounded time.
    async fn is_available(&self) -> bool;

    /// Load the full collection in insertion order
    async fn load_predictions(&self) -> Result<Vec<Prediction>>;

    /// Overwrite the full collection
    async fn replace_predictions(&self, predictions: &[Prediction]) -> Result<()>;
}

/// Trait defining the minimal key-value contract of a primary backend
///
/// A single string key holds the entire JSON-encoded collection, so no
/// transactions or per-record keys are needed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Lightweight liveness check
    async fn ping(&self) -> Result<(), KvError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// List keys matching a glob pattern (`*` and `?`)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;
}
