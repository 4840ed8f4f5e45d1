//! Universe Graph Sync
//!
//! Keeps many viewers in sync with a live cluster resource graph by
//! sending one full snapshot on connect and small deltas afterwards.
//!
//! # Features
//!
//! - **Delta Tracking**: Order-insensitive comparison of list-valued resource info
//! - **Broadcast Hub**: Single-writer actor, polls only while viewers are connected
//! - **Backpressure**: Slow viewers are evicted instead of stalling the others
//! - **Client Reconciler**: Local mirror, filtered view and minimal scene updates
//! - **Reconnect**: Exponential backoff with server-driven resync
//!
//! # Modules
//!
//! - `types`: Core data structures (Node, Link, Graph, DeltaUpdate)
//! - `delta`: Snapshot comparison producing full/delta updates
//! - `collector`: Graph sources polled by the hub
//! - `api`: WebSocket hub and HTTP endpoints
//! - `client`: Viewer-side mirror and reconnect loop
//! - `config`: Environment-driven settings
//! - `utils`: Utility functions (timestamps, ages)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use universe_sync::api::{create_router, AppState};
//! use universe_sync::collector::FileSource;
//! use universe_sync::SyncConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig::default();
//!     let source = Arc::new(FileSource::new(&config.graph_file));
//!     let state = Arc::new(AppState::spawn(source, &config));
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind(config.listen_addr).await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod api;
pub mod client;
pub mod collector;
pub mod config;
pub mod delta;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::websocket::{Hub, HubHandle};
pub use client::{GraphMirror, Reconciler, SyncClient, ViewFilter};
pub use collector::GraphSource;
pub use config::SyncConfig;
pub use delta::{DeltaTracker, TrackerOptions};
pub use types::{DeltaUpdate, Graph, Link, LinkRef, Node, ResourceInfo, SyncResult, UpdateKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
