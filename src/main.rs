//! Universe Graph Sync - Binary Entry Point
//!
//! Serves the graph file named by `UNIVERSE_GRAPH_FILE` to WebSocket
//! viewers on `UNIVERSE_LISTEN_ADDR`.

use std::sync::Arc;

use tokio::sync::mpsc;

use universe_sync::api::{create_router, AppState};
use universe_sync::collector::FileSource;
use universe_sync::{SyncConfig, SyncResult};

#[tokio::main]
async fn main() -> SyncResult<()> {
    // Warnings are logged once the subscriber exists
    let (config, warnings) = SyncConfig::from_env_with_warnings();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .init();

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        "{} v{} reading {}",
        universe_sync::NAME,
        universe_sync::VERSION,
        config.graph_file.display()
    );

    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })?;

    let source = Arc::new(FileSource::new(&config.graph_file));
    let state = Arc::new(AppState::spawn(source, &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
