use anyhow::Context;
use tracing_subscriber::EnvFilter;

use baby_organiser_api::config::config;
use baby_organiser_api::database::DatabaseManager;
use baby_organiser_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    tracing::info!("Starting Baby Organiser API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if config.database.ensure_schema {
        DatabaseManager::ensure_schema(&pool)
            .await
            .context("failed to apply database schema")?;
        tracing::info!("Database schema is up to date");
    }

    let feedsync = DatabaseManager::connect_feedsync(&config.database)
        .context("invalid FEEDSYNC_DATABASE_URL")?;

    let app = app(AppState::new(pool, config.clone()).with_feedsync(feedsync));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Baby Organiser API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
