//! Server lifecycle: bind, serve, and shut down on Ctrl+C.

use anyhow::{Context, Result};
use std::net::SocketAddr;

use crate::common::AppConfig;
use crate::server::{routes, AppState};
use crate::storage::UploadStore;

/// Run the API server until Ctrl+C.
///
/// Shutdown stops accepting HTTP requests and cancels serve tasks still
/// waiting for a downloader, releasing their ports. An in-flight transfer is
/// left to finish on its own.
pub async fn run(config: AppConfig) -> Result<()> {
    let store = UploadStore::open(config.upload_dir.clone()).await?;
    let state = AppState::new(config, store);
    let app = routes::create_router(&state);

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.api_port));
    let listener = std::net::TcpListener::bind(addr)
        .with_context(|| format!("failed to bind API port {}", state.config.api_port))?;
    listener
        .set_nonblocking(true)
        .context("failed to set listener to non-blocking mode")?;
    let port = listener.local_addr()?.port();
    tracing::info!(port, "API server listening");

    let handle = axum_server::Handle::new();
    let server_handle = handle.clone();
    let server = tokio::spawn(async move {
        axum_server::from_tcp(listener)
            .handle(server_handle)
            .serve(app.into_make_service())
            .await
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    tracing::info!("Ctrl+C received, shutting down");

    // Pending serve tasks first, then the HTTP listener
    state.shutdown.cancel();
    handle.shutdown();

    server.await.context("server task panicked")??;
    tracing::info!(
        sessions = state.registry.len(),
        "shutdown complete"
    );
    Ok(())
}
