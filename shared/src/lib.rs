use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Predicted gender of the baby
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Boy,
    Girl,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
        }
    }

    /// Parse the lowercase wire value ("boy" / "girl")
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "boy" => Some(Gender::Boy),
            "girl" => Some(Gender::Girl),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single guess as it travels over the wire and as it is stored.
///
/// Every typed field has a serde default so that documents written by older
/// revisions still load. Unknown fields land in `extra` and are written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Server-assigned ID in format: "pred_<epoch_millis>_<7 base36 chars>"
    #[serde(default)]
    pub id: String,
    /// Display name of the person guessing
    #[serde(default)]
    pub name: String,
    /// Absent only in legacy documents, always present in API responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Guessed due date (YYYY-MM-DD)
    #[serde(default)]
    pub due_date: String,
    /// Suggested baby name
    #[serde(default)]
    pub name_suggestion: String,
    /// Submission time (RFC 3339)
    #[serde(default)]
    pub timestamp: String,
    /// Caller-supplied fields outside the typed set
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of POST /api/predictions. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePredictionRequest {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    /// Deprecated alias of `gender`, only consulted when `gender` is absent
    pub guess: Option<Gender>,
    /// Guessed due date (YYYY-MM-DD)
    pub due_date: Option<String>,
    pub name_suggestion: Option<String>,
    /// Optional submission time override (RFC 3339)
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of PUT/PATCH /api/predictions/:id. Omitted fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePredictionRequest {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    /// Deprecated alias of `gender`, only consulted when `gender` is absent
    pub guess: Option<Gender>,
    pub due_date: Option<String>,
    pub name_suggestion: Option<String>,
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePredictionResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Diagnostics returned by GET /api/debug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    /// All keys currently held by the primary backend
    pub keys: Vec<String>,
    /// Raw value stored under the predictions key, if any
    pub predictions: Option<Value>,
    pub env_info: EnvInfo,
}

/// Presence flags and backend status. Never carries secret values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvInfo {
    pub has_kv_url: bool,
    pub has_kv_rest_api_token: bool,
    pub has_kv_rest_api_url: bool,
    pub is_vercel: bool,
    pub primary_backend: String,
    pub primary_reachable: bool,
    pub fallback_path: String,
}
