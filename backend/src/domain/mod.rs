//! # Domain Module
//!
//! Contains the business logic of the prediction board.
//!
//! The domain layer knows nothing about HTTP or about where the collection is
//! physically kept. It works against the `PredictionStorage` abstraction and
//! decides, per call, which backend serves the request.
//!
//! ## Module Organization
//!
//! - **models**: The `Prediction` entity, ID generation, defaults and merging
//! - **commands**: Internal input types produced by the REST mappers
//! - **prediction_service**: The persistence facade (list, get, save, update,
//!   delete) with backend selection, mirroring and fallback
//!
//! ## Business Rules
//!
//! - IDs are assigned by the service, never by the caller, and are unique
//! - Insertion order is display order
//! - Every mutation is a read-modify-write of the whole collection
//! - Reads never fail outward; failed writes on both backends do

pub mod commands;
pub mod models;
pub mod prediction_service;

pub use commands::predictions::{CreatePredictionCommand, UpdatePredictionCommand};
pub use models::prediction::{Prediction, PredictionValidationError};
pub use prediction_service::PredictionService;
