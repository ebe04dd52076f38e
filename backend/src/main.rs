use prediction_board::config::AppConfig;
use prediction_board::{create_router, initialize_backend};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    config.logging.init();

    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state);

    // Start the server
    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
