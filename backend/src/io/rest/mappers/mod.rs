//! Conversions between the `shared` wire DTOs and domain types.

pub mod prediction_mapper;
