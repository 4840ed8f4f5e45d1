//! WebSocket connection handler
//!
//! Each viewer connection runs two pumps. The write pump drains the
//! viewer's hub queue onto the socket and sends keepalive pings. The read
//! pump discards inbound frames and enforces the idle deadline. Whichever
//! pump stops first ends the connection and unregisters the viewer.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};

use super::hub::{ConsumerId, Payload};
use super::state::AppState;
use crate::config::ConnectionConfig;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.max_message_size(state.connection.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (id, queue) = match state.hub.register().await {
        Ok(registration) => registration,
        Err(e) => {
            tracing::warn!("Rejecting client: {}", e);
            return;
        }
    };

    let (sink, stream) = socket.split();
    let config = state.connection;

    let mut write_task = tokio::spawn(write_pump(id, sink, queue, config));
    let mut read_task = tokio::spawn(read_pump(id, stream, config));

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    // The hub may already have evicted this client
    let _ = state.hub.unregister(id).await;
}

/// Forward queued updates and keepalive pings to the client
async fn write_pump(
    id: ConsumerId,
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: mpsc::Receiver<Payload>,
    config: ConnectionConfig,
) {
    let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        let frame = tokio::select! {
            payload = queue.recv() => match payload {
                Some(payload) => Message::Text(payload.to_string()),
                None => {
                    // Hub closed the queue
                    let _ = timeout(config.write_timeout, sink.send(Message::Close(None))).await;
                    return;
                }
            },
            _ = ping.tick() => Message::Ping(Vec::new()),
        };

        match timeout(config.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(client = id, "WebSocket write failed: {}", e);
                return;
            }
            Err(_) => {
                tracing::warn!(client = id, "WebSocket write timed out");
                return;
            }
        }
    }
}

/// Consume client frames until the connection closes or goes idle
async fn read_pump(id: ConsumerId, mut stream: SplitStream<WebSocket>, config: ConnectionConfig) {
    loop {
        match timeout(config.read_timeout, stream.next()).await {
            Err(_) => {
                tracing::info!(client = id, "No traffic for {:?}, closing", config.read_timeout);
                return;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => return,
            Ok(Some(Err(e))) => {
                tracing::debug!(client = id, "WebSocket error: {}", e);
                return;
            }
            // Any frame, pongs included, proves the client is alive
            Ok(Some(Ok(_))) => {}
        }
    }
}
