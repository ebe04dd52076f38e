//! Local JSON file storage used when the primary backend is unreachable,
//! and as a mirror of the primary when it is.

pub mod connection;
pub mod prediction_repository;

pub use connection::JsonConnection;
pub use prediction_repository::PredictionFileRepository;
