//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use super::websocket::{handler::ws_handler, state::AppState, HubError};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins, viewers may be served elsewhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Hub introspection
        .route("/api/stats", get(get_stats))
        .route("/api/reset", post(reset_tracker))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        Self {
            error: e.to_string(),
            code: "HUB_UNAVAILABLE".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, Json(self)).into_response()
    }
}

/// GET /api/stats - tracked snapshot size and connected client count
async fn get_stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.hub.stats().await?))
}

/// POST /api/reset - force a full sync on the next poll
async fn reset_tracker(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.hub.reset_tracker().await?;
    Ok(StatusCode::NO_CONTENT)
}
