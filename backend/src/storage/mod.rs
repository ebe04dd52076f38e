//! # Storage Module
//!
//! Handles all persistence of the prediction collection.
//!
//! Two kinds of storage implement the same `PredictionStorage` trait:
//!
//! - **kv**: the primary backend. A `KeyValueStore` (hosted REST service,
//!   SQLite, or in-memory) holds the whole collection as one JSON array under
//!   a single key.
//! - **json**: the fallback. The same array, pretty-printed, in a local file.
//!
//! Neither store knows about the other; choosing between them and mirroring
//! writes is the domain layer's job.

pub mod json;
pub mod kv;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use json::{JsonConnection, PredictionFileRepository};
pub use kv::{
    KvError, KvPredictionRepository, MemoryKeyValueStore, RestKeyValueStore, SqliteKeyValueStore,
    UnconfiguredKeyValueStore,
};
pub use traits::{KeyValueStore, PredictionStorage};
