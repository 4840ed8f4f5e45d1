//! WebSocket module for live graph updates
//!
//! Provides the WebSocket endpoint at `/ws` that keeps viewers in sync
//! with the cluster graph.
//!
//! ## Features
//! - Full sync on connect, deltas afterwards
//! - Polling only while at least one viewer is connected
//! - Slow viewers are dropped instead of stalling the others
//! - Keepalive pings and idle-read deadline per connection

pub mod handler;
pub mod hub;
pub mod state;

// Re-export commonly used items
pub use hub::{ConsumerId, Hub, HubError, HubHandle, HubResult, HubStats, Payload, TickOutcome};
pub use state::AppState;
