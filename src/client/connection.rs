//! Reconnecting client loop
//!
//! The client never asks for a resync: every new connection starts with a
//! full sync from the server, so reconnecting is all recovery takes.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;

use super::{Reconciler, SceneListener};

/// Default first retry delay
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
/// Default retry delay ceiling
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential retry delay: doubles after every failure, capped at `max`
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Start over after a successful connection
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

/// Connection state shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    /// Waiting `delay` before reconnect attempt number `attempt`
    Reconnecting { attempt: u32, delay: Duration },
    Stopped,
}

/// Errors reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not establish a connection
    Connect(String),
    /// An established connection failed
    Receive(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "Connect failed: {}", msg),
            TransportError::Receive(msg) => write!(f, "Receive failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Text frames received on one connection. The stream ends when the
/// connection closes.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Something that can open a connection to the sync endpoint
pub trait Transport: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, TransportError>>;
}

/// Drives a [`Reconciler`] from a transport, reconnecting on loss
pub struct SyncClient<L> {
    reconciler: Reconciler<L>,
    backoff: Backoff,
    status: watch::Sender<ConnectionStatus>,
}

impl<L: SceneListener> SyncClient<L> {
    pub fn new(reconciler: Reconciler<L>, backoff: Backoff) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        Self {
            reconciler,
            backoff,
            status,
        }
    }

    /// Subscribe to connection status changes
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn reconciler(&self) -> &Reconciler<L> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<L> {
        &mut self.reconciler
    }

    pub fn into_reconciler(self) -> Reconciler<L> {
        self.reconciler
    }

    /// Keep the mirror in sync until `shutdown` resolves
    pub async fn run<T, S>(&mut self, transport: &T, shutdown: S)
    where
        T: Transport + ?Sized,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut attempt: u32 = 0;
        self.publish(ConnectionStatus::Connecting);

        'outer: loop {
            let connected = tokio::select! {
                _ = &mut shutdown => break 'outer,
                result = transport.connect() => result,
            };

            match connected {
                Ok(mut frames) => {
                    tracing::info!("Connected to sync endpoint");
                    self.backoff.reset();
                    attempt = 0;
                    self.publish(ConnectionStatus::Connected);

                    loop {
                        let frame = tokio::select! {
                            _ = &mut shutdown => break 'outer,
                            frame = frames.next() => frame,
                        };

                        match frame {
                            Some(Ok(text)) => {
                                if let Err(e) = self.reconciler.handle_text(&text) {
                                    tracing::warn!("Dropping update: {}", e);
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!("Connection lost: {}", e);
                                break;
                            }
                            None => {
                                tracing::info!("Connection closed by server");
                                break;
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            }

            attempt = attempt.saturating_add(1);
            let delay = self.backoff.next_delay();
            self.publish(ConnectionStatus::Reconnecting { attempt, delay });

            tokio::select! {
                _ = &mut shutdown => break 'outer,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.publish(ConnectionStatus::Stopped);
    }

    fn publish(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }
}
