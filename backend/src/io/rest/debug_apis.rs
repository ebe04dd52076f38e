//! # REST API for Diagnostics
//!
//! Reports what the primary backend currently holds and which variables the
//! hosting environment provides. Secret values are never echoed, only their
//! presence.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::Value;
use tracing::{error, info};

use super::prediction_apis::error_response;
use crate::storage::KvError;
use crate::AppState;
use shared::{DebugResponse, EnvInfo};

const NO_CACHE_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// Dump the primary's keys and raw predictions value
pub async fn get_debug_info(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/debug");

    let service = &state.prediction_service;
    let primary_reachable = service.primary_reachable().await;
    let flags = &state.config.env_flags;

    let env_info = EnvInfo {
        has_kv_url: flags.has_kv_url,
        has_kv_rest_api_token: flags.has_kv_rest_api_token,
        has_kv_rest_api_url: flags.has_kv_rest_api_url,
        is_vercel: flags.is_vercel,
        primary_backend: service.primary_backend_name().to_string(),
        primary_reachable,
        fallback_path: service.fallback_path().display().to_string(),
    };

    let (keys, predictions) = if primary_reachable {
        match read_primary(&state).await {
            Ok(contents) => contents,
            Err(e) => {
                error!("Debug endpoint error: {}", e);
                return (NO_CACHE_HEADERS, error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
                    .into_response();
            }
        }
    } else {
        (Vec::new(), None)
    };

    (
        StatusCode::OK,
        NO_CACHE_HEADERS,
        Json(DebugResponse { keys, predictions, env_info }),
    )
        .into_response()
}

async fn read_primary(state: &AppState) -> Result<(Vec<String>, Option<Value>), KvError> {
    let keys = state.kv_store.keys("*").await?;
    let raw = state.kv_store.get(&state.config.predictions_key).await?;

    // a value that is not JSON is still worth showing
    let predictions = raw.map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));

    Ok((keys, predictions))
}
