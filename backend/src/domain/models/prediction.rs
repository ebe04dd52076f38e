//! Domain model for a single baby prediction.
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use shared::Gender;
use uuid::Uuid;

use crate::domain::commands::predictions::{CreatePredictionCommand, UpdatePredictionCommand};

pub const DEFAULT_NAME: &str = "Anonymous";

const ID_PREFIX: &str = "pred";
const ID_SUFFIX_LEN: usize = 7;
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub due_date: String,     // YYYY-MM-DD
    pub name_suggestion: String,
    pub timestamp: String,    // RFC 3339
    pub extra: Map<String, Value>,
}

impl Prediction {
    /// Generate a prediction ID: "pred_<epoch_millis>_<7 random base36 chars>"
    pub fn generate_id(now_millis: i64) -> String {
        let mut seed = Uuid::new_v4().as_u128();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| {
                let c = BASE36_ALPHABET[(seed % 36) as usize] as char;
                seed /= 36;
                c
            })
            .collect();
        format!("{}_{}_{}", ID_PREFIX, now_millis, suffix)
    }

    /// Check that an ID has the shape produced by `generate_id`
    pub fn is_valid_id(id: &str) -> bool {
        let mut parts = id.splitn(3, '_');
        let (Some(prefix), Some(millis), Some(suffix)) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        prefix == ID_PREFIX
            && !millis.is_empty()
            && millis.chars().all(|c| c.is_ascii_digit())
            && suffix.len() == ID_SUFFIX_LEN
            && suffix.bytes().all(|b| BASE36_ALPHABET.contains(&b))
    }

    /// Build a new record from a create command, filling defaults.
    ///
    /// Blank strings count as absent, so `name: ""` still becomes "Anonymous".
    pub fn from_command(command: CreatePredictionCommand, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate_id(now.timestamp_millis()),
            name: non_blank(command.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            gender: command.gender.unwrap_or_default(),
            due_date: non_blank(command.due_date)
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            name_suggestion: command.name_suggestion.unwrap_or_default(),
            timestamp: non_blank(command.timestamp)
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            extra: command.extra,
        }
    }

    /// Shallow merge: supplied fields overwrite, omitted fields are kept.
    /// The ID is never touched.
    pub fn apply_update(&mut self, command: &UpdatePredictionCommand) {
        if let Some(name) = &command.name {
            self.name = name.clone();
        }
        if let Some(gender) = command.gender {
            self.gender = gender;
        }
        if let Some(due_date) = &command.due_date {
            self.due_date = due_date.clone();
        }
        if let Some(name_suggestion) = &command.name_suggestion {
            self.name_suggestion = name_suggestion.clone();
        }
        if let Some(timestamp) = &command.timestamp {
            self.timestamp = timestamp.clone();
        }
        for (key, value) in &command.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PredictionValidationError {
    #[error("Name cannot exceed {max} characters")]
    NameTooLong { max: usize },
    #[error("Due date must be in YYYY-MM-DD format: {0}")]
    InvalidDueDate(String),
    #[error("Timestamp must be an ISO-8601 date-time: {0}")]
    InvalidTimestamp(String),
}
