//! # REST API for Predictions
//!
//! Endpoints for listing, creating, retrieving, updating, and deleting
//! predictions, plus the health check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::domain::PredictionValidationError;
use crate::io::rest::mappers::prediction_mapper::PredictionMapper;
use crate::AppState;
use shared::{
    CreatePredictionRequest, DeletePredictionResponse, ErrorResponse, HealthResponse, UpdatePredictionRequest,
};

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// 400 for validation failures, 500 with the given message for anything else
fn failure_response(e: &anyhow::Error, message: &str) -> Response {
    match e.downcast_ref::<PredictionValidationError>() {
        Some(validation) => error_response(StatusCode::BAD_REQUEST, validation.to_string()),
        None => error_response(StatusCode::INTERNAL_SERVER_ERROR, message),
    }
}

/// List all predictions
pub async fn list_predictions(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/predictions");

    let predictions = state.prediction_service.list_all().await;
    (StatusCode::OK, Json(PredictionMapper::to_dto_list(predictions)))
}

/// Get a prediction by ID
pub async fn get_prediction(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/predictions/{}", id);

    match state.prediction_service.get_by_id(&id).await {
        Some(prediction) => (StatusCode::OK, Json(PredictionMapper::to_dto(prediction))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Prediction not found"),
    }
}

/// Create a new prediction
pub async fn create_prediction(
    State(state): State<AppState>,
    Json(request): Json<CreatePredictionRequest>,
) -> impl IntoResponse {
    info!("POST /api/predictions - request: {:?}", request);

    let command = PredictionMapper::to_create_command(request);
    match state.prediction_service.save(command).await {
        Ok(prediction) => {
            info!("Created prediction {}", prediction.id);
            (StatusCode::CREATED, Json(PredictionMapper::to_prediction_response(prediction))).into_response()
        }
        Err(e) => {
            error!("Failed to save prediction: {:#}", e);
            failure_response(&e, "Failed to save prediction")
        }
    }
}

/// Update a prediction (PUT and PATCH both merge)
pub async fn update_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePredictionRequest>,
) -> impl IntoResponse {
    info!("Update /api/predictions/{} - request: {:?}", id, request);

    let command = PredictionMapper::to_update_command(request);
    match state.prediction_service.update(&id, command).await {
        Ok(Some(prediction)) => {
            (StatusCode::OK, Json(PredictionMapper::to_prediction_response(prediction))).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Prediction not found"),
        Err(e) => {
            error!("Failed to update prediction: {:#}", e);
            failure_response(&e, "Failed to update prediction")
        }
    }
}

/// Delete a prediction. Unknown IDs succeed.
pub async fn delete_prediction(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/predictions/{}", id);

    match state.prediction_service.delete_by_id(&id).await {
        Ok(()) => (StatusCode::OK, Json(DeletePredictionResponse { success: true })).into_response(),
        Err(e) => {
            error!("Failed to delete prediction: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete prediction")
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".to_string() })
}
