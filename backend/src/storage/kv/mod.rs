//! Primary key-value backends and the repository that keeps the prediction
//! collection under a single key.

pub mod memory;
pub mod prediction_repository;
pub mod rest;
pub mod sqlite;
pub mod unconfigured;

pub use memory::MemoryKeyValueStore;
pub use prediction_repository::{KvPredictionRepository, DEFAULT_PREDICTIONS_KEY};
pub use rest::RestKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
pub use unconfigured::UnconfiguredKeyValueStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("no primary key-value backend is configured")]
    NotConfigured,

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid key pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
}
