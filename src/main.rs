use std::sync::Arc;

use tasktrack_api::config::config;
use tasktrack_api::database::DatabaseManager;
use tasktrack_api::services::LogMailer;
use tasktrack_api::{app, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config().clone();
    init_tracing(&config);
    config.validate()?;
    tracing::info!("Starting TaskTrack API in {:?} mode", config.environment);

    let store = DatabaseManager::connect(&config.database).await?;
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, store, Arc::new(LogMailer));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
