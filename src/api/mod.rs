//! API module for HTTP and WebSocket endpoints
//!
//! This module provides the WebSocket sync endpoint and a small HTTP
//! surface for health checks and hub introspection.

pub mod http;
pub mod websocket;

pub use http::create_router;
pub use websocket::AppState;
