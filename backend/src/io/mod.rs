//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain logic.
//!
//! Translates requests into domain commands, runs them against the
//! `PredictionService`, and turns domain results and errors into JSON
//! responses with the right status codes.
//!
//! ## Supported Operations
//!
//! - **GET/POST /api/predictions**: List and create predictions
//! - **GET/PUT/PATCH/DELETE /api/predictions/:id**: Single-record access
//! - **GET /api/debug**: Backend diagnostics
//! - **GET /api/health**: Liveness

pub mod rest;
