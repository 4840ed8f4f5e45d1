//! Viewer-side reconciliation
//!
//! ```text
//! frame -> Reconciler -> GraphMirror -> ViewFilter -> VisibleGraph
//!                                                        |
//!                             SceneListener <- SceneDiff (prev vs next)
//! ```
//!
//! [`SyncClient`] feeds frames from a [`Transport`] and reconnects with
//! [`Backoff`] when the connection drops.

mod connection;
mod filter;
mod mirror;
mod reconciler;
mod scene;

pub use connection::{
    Backoff, ConnectionStatus, FrameStream, SyncClient, Transport, TransportError,
    DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF,
};
pub use filter::{ViewFilter, VisibleGraph};
pub use mirror::GraphMirror;
pub use reconciler::{ReconcileError, ReconcileResult, Reconciler};
pub use scene::{SceneDiff, SceneListener, SceneUpdate};
