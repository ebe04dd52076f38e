use serde_json::{Map, Value};
use shared::{
    CreatePredictionRequest, Gender, Prediction as SharedPrediction, PredictionResponse,
    UpdatePredictionRequest,
};

use crate::domain::commands::predictions::{CreatePredictionCommand, UpdatePredictionCommand};
use crate::domain::models::prediction::Prediction as DomainPrediction;
use tracing::warn;

/// Legacy name of the `gender` field
const LEGACY_GENDER_FIELD: &str = "guess";

/// Mapper to convert between shared Prediction DTOs and domain Prediction models.
pub struct PredictionMapper;

impl PredictionMapper {
    /// Parses a stored collection document.
    ///
    /// Only a document that is not a JSON array is an error. Each element is
    /// converted on its own, so one odd record never hides the others.
    pub fn parse_collection(raw: &str) -> serde_json::Result<Vec<DomainPrediction>> {
        let records: Vec<Value> = serde_json::from_str(raw)?;
        Ok(records.into_iter().filter_map(Self::to_domain).collect())
    }

    /// Converts one stored record to the domain model, leniently.
    ///
    /// Text fields that are missing or null read as empty; numbers and
    /// booleans are kept as their JSON text. A gender is matched without
    /// regard to case. Records written before `gender` existed carry a
    /// `guess` field instead, which is folded into `gender` here. Anything
    /// else without a usable gender reads as a boy guess. Elements that are
    /// not objects are skipped.
    pub fn to_domain(record: Value) -> Option<DomainPrediction> {
        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                warn!("Skipping stored prediction that is not an object: {}", other);
                return None;
            }
        };

        let id = Self::take_text(&mut fields, "id");
        let name = Self::take_text(&mut fields, "name");
        let due_date = Self::take_text(&mut fields, "dueDate");
        let name_suggestion = Self::take_text(&mut fields, "nameSuggestion");
        let timestamp = Self::take_text(&mut fields, "timestamp");

        let gender = match fields.remove("gender").as_ref().and_then(Self::parse_gender) {
            Some(gender) => gender,
            None => match fields.get(LEGACY_GENDER_FIELD).and_then(Self::parse_gender) {
                Some(gender) => {
                    fields.remove(LEGACY_GENDER_FIELD);
                    gender
                }
                None => Gender::default(),
            },
        };

        Some(DomainPrediction {
            id,
            name,
            gender,
            due_date,
            name_suggestion,
            timestamp,
            extra: fields,
        })
    }

    fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
        match fields.remove(key) {
            Some(Value::String(text)) => text,
            Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
            _ => String::new(),
        }
    }

    fn parse_gender(value: &Value) -> Option<Gender> {
        value
            .as_str()
            .and_then(|raw| Gender::parse(&raw.trim().to_ascii_lowercase()))
    }

    /// Converts a domain Prediction model to a shared Prediction DTO.
    pub fn to_dto(domain: DomainPrediction) -> SharedPrediction {
        SharedPrediction {
            id: domain.id,
            name: domain.name,
            gender: Some(domain.gender),
            due_date: domain.due_date,
            name_suggestion: domain.name_suggestion,
            timestamp: domain.timestamp,
            extra: domain.extra,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainPrediction>) -> Vec<SharedPrediction> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreatePredictionRequest) -> CreatePredictionCommand {
        CreatePredictionCommand {
            name: request.name,
            gender: request.gender.or(request.guess),
            due_date: request.due_date,
            name_suggestion: request.name_suggestion,
            timestamp: request.timestamp,
            extra: Self::without_reserved_fields(request.extra),
        }
    }

    pub fn to_update_command(request: UpdatePredictionRequest) -> UpdatePredictionCommand {
        UpdatePredictionCommand {
            name: request.name,
            gender: request.gender.or(request.guess),
            due_date: request.due_date,
            name_suggestion: request.name_suggestion,
            timestamp: request.timestamp,
            extra: Self::without_reserved_fields(request.extra),
        }
    }

    pub fn to_prediction_response(domain: DomainPrediction) -> PredictionResponse {
        PredictionResponse {
            success: true,
            prediction: Self::to_dto(domain),
        }
    }

    /// IDs are server-assigned and immutable; a client-sent `id` is dropped
    fn without_reserved_fields(mut extra: Map<String, Value>) -> Map<String, Value> {
        extra.remove("id");
        extra
    }
}
