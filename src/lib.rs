use std::sync::Arc;

use anyhow::Context;
use config::Config;
use routes::init_router;
use state::AppState;
use tokio::net::TcpListener;

pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod middlewares;
pub mod model;
pub mod routes;
pub mod state;
pub mod telemetry;

pub async fn run() -> Result<(), anyhow::Error> {
    let config = Config::new().context("Failed to read configuration.")?;
    let address = config.application.get_address();
    let state = AppState::init(config)
        .await
        .context("Failed to initialise application state.")?;

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Unable to bind {address}"))?;

    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), anyhow::Error> {
    let router = init_router(Arc::new(state));

    tracing::info!("Starting server: {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
