//! # Prediction Board Backend
//!
//! A small web service where visitors record guesses about an expected baby
//! (gender, due date, name suggestion) and browse everyone else's guesses.
//!
//! ## Architecture Overview
//!
//! - **Storage Layer** (`storage`): A primary key-value backend (hosted REST
//!   service, SQLite, or in-memory) and a local JSON file fallback, both
//!   behind the `PredictionStorage` trait
//! - **Domain Layer** (`domain`): The `PredictionService` persistence facade
//!   that pings the primary on every call, falls back to the file, and
//!   mirrors successful primary writes into it
//! - **IO Layer** (`io`): Axum REST handlers and DTO mappers
//! - **Config** (`config`): Environment-driven settings and logging setup
//!
//! ## Key Responsibilities
//!
//! - Initialize and configure the application state
//! - Set up the REST API router with CORS and optional static files

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, PrimaryBackend};
use crate::domain::PredictionService;
use crate::storage::{
    JsonConnection, KeyValueStore, KvPredictionRepository, MemoryKeyValueStore, PredictionFileRepository,
    RestKeyValueStore, SqliteKeyValueStore, UnconfiguredKeyValueStore,
};

/// Main application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub prediction_service: PredictionService,
    /// Raw primary store, used by diagnostics only
    pub kv_store: Arc<dyn KeyValueStore>,
    pub config: Arc<AppConfig>,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up {} primary backend", config.primary.name());
    debug!("Primary backend settings: {:?}", config.primary);
    let kv_store = create_key_value_store(config).await?;

    info!("Setting up fallback storage at {}", config.data_file.display());
    let fallback = PredictionFileRepository::new(JsonConnection::new(&config.data_file));

    info!("Setting up domain model");
    let primary = KvPredictionRepository::new(kv_store.clone(), config.predictions_key.clone(), config.ping_timeout);
    let prediction_service = PredictionService::new(Arc::new(primary), Arc::new(fallback));

    info!("Setting up application state");
    Ok(AppState {
        prediction_service,
        kv_store,
        config: Arc::new(config.clone()),
    })
}

async fn create_key_value_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match &config.primary {
        PrimaryBackend::Rest { url, token } => {
            Arc::new(RestKeyValueStore::new(url, token, config.ping_timeout)?)
        }
        PrimaryBackend::Sqlite { url } => match SqliteKeyValueStore::new(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Failed to open SQLite backend at {} ({:#}), running on file storage only", url, e);
                Arc::new(UnconfiguredKeyValueStore)
            }
        },
        PrimaryBackend::Memory => Arc::new(MemoryKeyValueStore::new()),
        PrimaryBackend::None => {
            warn!("No primary backend configured, running on file storage only");
            Arc::new(UnconfiguredKeyValueStore)
        }
    };
    Ok(store)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let static_dir = app_state.config.static_dir.clone();

    let api_routes = Router::new()
        .route(
            "/predictions",
            get(io::rest::prediction_apis::list_predictions).post(io::rest::prediction_apis::create_prediction),
        )
        .route(
            "/predictions/:id",
            get(io::rest::prediction_apis::get_prediction)
                .put(io::rest::prediction_apis::update_prediction)
                .patch(io::rest::prediction_apis::update_prediction)
                .delete(io::rest::prediction_apis::delete_prediction),
        )
        .route("/debug", get(io::rest::debug_apis::get_debug_info))
        .route("/health", get(io::rest::prediction_apis::health));

    let router = Router::new().nest("/api", api_routes);

    let router = match static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.layer(cors).with_state(app_state)
}
