/**
 * casedesk Server Entry Point
 *
 * Loads configuration from the environment (and `.env`), builds the app
 * and serves it on `0.0.0.0:SERVER_PORT`.
 */

use casedesk::backend::create_app;
use casedesk::backend::server::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("[STARTUP] Server initialization started");

    let port = config.server_port;
    let (app, _state) = create_app(config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[STARTUP] Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
