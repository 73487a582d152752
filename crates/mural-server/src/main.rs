mod config;

use std::net::SocketAddr;

use tracing::{info, warn};

use mural_api::routes;
use mural_api::state::AppStateInner;
use mural_api::token::TokenKeys;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mural=debug,mural_api=debug,mural_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    info!(database = ?config.database, "Configuration loaded");

    let stores = mural_db::connect(&config.database).await?;
    let tokens = TokenKeys::new(config.secret_key.as_bytes(), config.token_ttl);
    let state = AppStateInner::new(stores, tokens)?;

    let app = routes::router(state, config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Mural API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
