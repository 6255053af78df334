//! HBnB API server
//!
//! Loads `.env`, parses configuration, opens the selected storage backend
//! and serves the REST API until Ctrl-C.

use axum::extract::Request;
use axum::ServiceExt;
use clap::Parser;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

use hbnb::config::Config;
use hbnb::storage::Storage;
use hbnb::{api, APP_VERSION};

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();

    tracing::info!("HBnB API v{}", APP_VERSION);

    let storage = Storage::from_config(&config).await?;

    // Trailing slashes are stripped before routing, so "/status/" and
    // "/status" reach the same handler.
    let app = NormalizePathLayer::trim_trailing_slash().layer(api::router(storage.clone()));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.backend.close().await;
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
