use anyhow::{Context, Result};
use secrets_gateway_server::config::AppConfig;
use secrets_gateway_server::{AppState, build_router};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    info!("starting secrets gateway");

    let state = AppState::from_config(&config)?;
    info!(
        providers = ?state.providers.enabled_providers(),
        "identity providers enabled"
    );
    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("server listening on http://{bind_addr}");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
