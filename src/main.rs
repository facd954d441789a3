mod actor_framework;
mod api;
mod app_system;
mod cart_actor;
mod clients;
mod config;
mod domain;
mod error;
mod notifier;
mod persistence;
mod product_actor;
mod session;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::app_system::{setup_tracing, CatalogSystem};
use crate::config::ServerConfig;
use crate::persistence::{FileBackend, SnapshotBackend};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = ServerConfig::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "Starting catalog service"
    );

    let backend: Arc<dyn SnapshotBackend> = Arc::new(FileBackend::open(&config.data_dir)?);
    let system = CatalogSystem::start(&config, backend)?;
    let router = create_router(system.app_state(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match tokio::time::timeout(SHUTDOWN_GRACE, system.shutdown()).await {
        Ok(Ok(())) => info!("Application completed successfully"),
        Ok(Err(e)) => error!(error = %e, "Store actor failed during shutdown"),
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Store actors still referenced by open connections, exiting anyway"
        ),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
