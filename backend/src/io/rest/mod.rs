//! # REST API Interface Layer
//!
//! HTTP endpoints of the prediction board. This layer handles:
//! - JSON request/response serialization
//! - Mapping between wire DTOs and domain types
//! - Error translation from domain to HTTP status codes
//! - Request logging
//!
//! Handlers contain no business logic; everything goes through the
//! `PredictionService` held in `AppState`.

pub mod debug_apis;
pub mod mappers;
pub mod prediction_apis;
