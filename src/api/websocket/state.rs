//! WebSocket application state

use std::sync::Arc;

use super::hub::{Hub, HubHandle};
use crate::collector::GraphSource;
use crate::config::{ConnectionConfig, SyncConfig};

/// Shared application state for HTTP and WebSocket handlers
pub struct AppState {
    /// Handle to the broadcast hub task
    pub hub: HubHandle,

    /// Keepalive and limits applied to every viewer connection
    pub connection: ConnectionConfig,
}

impl AppState {
    /// Create state around an already running hub
    pub fn new(hub: HubHandle, connection: ConnectionConfig) -> Self {
        Self { hub, connection }
    }

    /// Spawn a hub polling `source` and wrap it in state
    pub fn spawn(source: Arc<dyn GraphSource>, config: &SyncConfig) -> Self {
        let hub = Hub::spawn(source, config.hub_config());
        Self::new(hub, config.connection_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::StaticSource;
    use crate::types::Graph;

    #[tokio::test]
    async fn test_spawn_uses_config() {
        let config = SyncConfig {
            max_message_size: 1024,
            ..SyncConfig::default()
        };
        let state = AppState::spawn(Arc::new(StaticSource::new(Graph::empty())), &config);

        assert_eq!(state.connection.max_message_size, 1024);
        assert_eq!(state.hub.stats().await.unwrap().connected_clients, 0);
    }
}
