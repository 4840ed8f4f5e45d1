//! Broadcast hub
//!
//! The hub task is the single owner of the viewer set and the delta
//! tracker. Everything that touches that state arrives as a message:
//! commands from [`HubHandle`]s, timer ticks, and finished collector
//! fetches. Fetches run on the blocking pool so a slow collector never
//! stalls registration traffic.
//!
//! ```text
//!  HubHandle ──commands──┐
//!  interval ──tick───────┼──► Hub::run ──try_send──► viewer queues
//!  spawn_blocking ◄──────┘        ▲
//!    (collector) ──fetched────────┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};

use crate::collector::{CollectorError, CollectorResult, GraphSource};
use crate::config::HubConfig;
use crate::delta::{DeltaError, DeltaTracker};
use crate::types::{DeltaUpdate, Graph, UpdateKind};

/// Identifies one registered viewer
pub type ConsumerId = u64;

/// Serialized update queued for a viewer
pub type Payload = Arc<str>;

/// Result type for HubHandle operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors returned by [`HubHandle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The hub task has stopped
    Closed,
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubError::Closed => write!(f, "hub is not running"),
        }
    }
}

impl std::error::Error for HubError {}

/// Hub introspection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub previous_nodes: usize,
    pub previous_links: usize,
    pub connected_clients: usize,
}

/// What a poll cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No viewers connected, the collector was not called
    Idle,
    /// The snapshot matched the previous one
    Unchanged,
    /// An update was fanned out
    Broadcast {
        kind: UpdateKind,
        delivered: usize,
        evicted: usize,
    },
    FetchFailed(String),
    SerializeFailed(String),
    /// The collector returned a snapshot with an absent container
    InvalidSnapshot(DeltaError),
    /// A newer snapshot had already been applied while this one was fetched
    Superseded,
}

enum HubCommand {
    Register {
        id: ConsumerId,
        queue: mpsc::Sender<Payload>,
    },
    Unregister(ConsumerId),
    Refresh(Option<oneshot::Sender<TickOutcome>>),
    ResetTracker,
    Stats(oneshot::Sender<HubStats>),
}

/// Order in which collector calls were started
type FetchSeq = u64;

enum Fetched {
    Tick(FetchSeq, CollectorResult<Graph>),
    Bootstrap(ConsumerId, FetchSeq, CollectorResult<Graph>),
}

/// Where a viewer's mirror stands relative to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Initial full sync not enqueued yet; skipped by fan-out
    AwaitingBootstrap,
    /// Mirror may not match the tracker; gets the next snapshot in full
    NeedsFull,
    /// Mirror matches the tracker's previous snapshot, deltas apply
    Synced,
}

struct Consumer {
    queue: mpsc::Sender<Payload>,
    state: SyncState,
}

/// Cloneable handle used to talk to the hub task
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl HubHandle {
    /// Register a new viewer with the configured queue capacity.
    ///
    /// The returned queue yields a full sync right away, then deltas.
    /// It closes when the viewer is unregistered or evicted.
    pub async fn register(&self) -> HubResult<(ConsumerId, mpsc::Receiver<Payload>)> {
        self.register_with_capacity(self.queue_capacity).await
    }

    /// Register a new viewer with an explicit queue capacity
    pub async fn register_with_capacity(
        &self,
        capacity: usize,
    ) -> HubResult<(ConsumerId, mpsc::Receiver<Payload>)> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (queue, rx) = mpsc::channel(capacity.max(1));
        self.send(HubCommand::Register { id, queue }).await?;
        Ok((id, rx))
    }

    /// Remove a viewer; unknown ids are ignored
    pub async fn unregister(&self, id: ConsumerId) -> HubResult<()> {
        self.send(HubCommand::Unregister(id)).await
    }

    /// Run a poll cycle now and wait for its outcome.
    ///
    /// If a cycle is already fetching, this waits for that one instead of
    /// starting another.
    pub async fn refresh(&self) -> HubResult<TickOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Refresh(Some(tx))).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Forget the previous snapshot so the next cycle broadcasts a full sync
    pub async fn reset_tracker(&self) -> HubResult<()> {
        self.send(HubCommand::ResetTracker).await
    }

    pub async fn stats(&self) -> HubResult<HubStats> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Stats(tx)).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn send(&self, command: HubCommand) -> HubResult<()> {
        self.commands.send(command).await.map_err(|_| HubError::Closed)
    }
}


/// The hub task state
///
/// Every `Synced` viewer mirrors the snapshot the tracker holds. Snapshots
/// reach the tracker in fetch order; an older one arriving late is dropped.
pub struct Hub {
    source: Arc<dyn GraphSource>,
    config: HubConfig,
    tracker: DeltaTracker,
    consumers: HashMap<ConsumerId, Consumer>,
    tick_in_flight: bool,
    tick_waiters: Vec<oneshot::Sender<TickOutcome>>,
    fetched_tx: mpsc::UnboundedSender<Fetched>,
    next_seq: FetchSeq,
    /// Fetch that produced the tracker's current snapshot
    tracker_seq: FetchSeq,
}

impl Hub {
    /// Spawn the hub on the current tokio runtime.
    ///
    /// The hub stops once every handle has been dropped.
    pub fn spawn(source: Arc<dyn GraphSource>, config: HubConfig) -> HubHandle {
        let (commands, commands_rx) = mpsc::channel(64);
        let (fetched_tx, fetched_rx) = mpsc::unbounded_channel();

        let hub = Hub {
            source,
            config,
            tracker: DeltaTracker::with_options(config.tracker),
            consumers: HashMap::new(),
            tick_in_flight: false,
            tick_waiters: Vec::new(),
            fetched_tx,
            next_seq: 1,
            tracker_seq: 0,
        };
        tokio::spawn(hub.run(commands_rx, fetched_rx));

        HubHandle {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
            queue_capacity: config.queue_capacity,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<HubCommand>,
        mut fetched: mpsc::UnboundedReceiver<Fetched>,
    ) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = ticker.tick() => self.start_tick(None),
                Some(result) = fetched.recv() => self.handle_fetched(result),
            }
        }

        tracing::debug!("hub stopped");
    }

    fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register { id, queue } => {
                self.consumers.insert(
                    id,
                    Consumer {
                        queue,
                        state: SyncState::AwaitingBootstrap,
                    },
                );
                tracing::info!(client = id, "Client connected. Total clients: {}", self.consumers.len());
                self.spawn_bootstrap(id);
            }
            HubCommand::Unregister(id) => {
                // Dropping the sender closes the viewer's queue
                if self.consumers.remove(&id).is_some() {
                    tracing::info!(client = id, "Client disconnected. Total clients: {}", self.consumers.len());
                }
            }
            HubCommand::Refresh(reply) => self.start_tick(reply),
            HubCommand::ResetTracker => {
                self.tracker.reset();
                tracing::info!("Delta tracker reset");
            }
            HubCommand::Stats(reply) => {
                let tracker = self.tracker.stats();
                let _ = reply.send(HubStats {
                    previous_nodes: tracker.previous_nodes,
                    previous_links: tracker.previous_links,
                    connected_clients: self.consumers.len(),
                });
            }
        }
    }

    fn start_tick(&mut self, reply: Option<oneshot::Sender<TickOutcome>>) {
        if self.consumers.is_empty() {
            if let Some(reply) = reply {
                let _ = reply.send(TickOutcome::Idle);
            }
            return;
        }

        self.tick_waiters.extend(reply);
        if self.tick_in_flight {
            tracing::debug!("previous fetch still running, skipping tick");
            return;
        }

        self.tick_in_flight = true;
        self.spawn_fetch(Fetched::Tick);
    }

    fn spawn_bootstrap(&mut self, id: ConsumerId) {
        self.spawn_fetch(move |seq, result| Fetched::Bootstrap(id, seq, result));
    }

    /// Call the collector on the blocking pool and feed the result back
    /// into the hub loop.
    fn spawn_fetch<F>(&mut self, wrap: F)
    where
        F: FnOnce(FetchSeq, CollectorResult<Graph>) -> Fetched + Send + 'static,
    {
        let seq = self.next_seq;
        self.next_seq += 1;
        let source = Arc::clone(&self.source);
        let fetched_tx = self.fetched_tx.clone();

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || source.snapshot())
                .await
                .unwrap_or_else(|e| {
                    Err(CollectorError::Unavailable(format!("collector task failed: {}", e)))
                });
            let _ = fetched_tx.send(wrap(seq, result));
        });
    }

    fn handle_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Tick(seq, result) => {
                self.tick_in_flight = false;
                let outcome = self.process_tick(seq, result);
                for waiter in self.tick_waiters.drain(..) {
                    let _ = waiter.send(outcome.clone());
                }
            }
            Fetched::Bootstrap(id, seq, result) => self.process_bootstrap(id, seq, result),
        }
    }

    fn process_tick(&mut self, seq: FetchSeq, result: CollectorResult<Graph>) -> TickOutcome {
        let graph = match result {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!("Failed to fetch graph data: {}", e);
                return TickOutcome::FetchFailed(e.to_string());
            }
        };

        if seq < self.tracker_seq {
            tracing::debug!("tick snapshot is older than the tracked one, discarding");
            return TickOutcome::Superseded;
        }

        self.apply_snapshot(seq, &graph, None)
    }

    fn process_bootstrap(&mut self, id: ConsumerId, seq: FetchSeq, result: CollectorResult<Graph>) {
        if !self.consumers.contains_key(&id) {
            tracing::debug!(client = id, "client left before its initial update was ready");
            return;
        }

        let graph = match result {
            Ok(graph) => graph,
            Err(e) => {
                // The next successful tick sends the full sync
                tracing::warn!(client = id, "Failed to fetch initial graph data: {}", e);
                self.set_state(id, SyncState::NeedsFull);
                return;
            }
        };

        if seq < self.tracker_seq {
            tracing::debug!(client = id, "initial snapshot went stale while fetching, retrying");
            self.spawn_bootstrap(id);
            return;
        }

        self.apply_snapshot(seq, &graph, Some(id));

        match self.consumers.get(&id).map(|c| c.state) {
            Some(SyncState::Synced) => tracing::info!(
                client = id,
                "Sent initial full update to new client ({} nodes, {} links)",
                graph.node_count(),
                graph.link_count()
            ),
            Some(_) => self.set_state(id, SyncState::NeedsFull),
            None => {}
        }
    }

    /// Feed a snapshot to the tracker and bring every viewer up to it.
    ///
    /// `Synced` viewers get the delta. `NeedsFull` viewers, and the viewer
    /// named by `bootstrap`, get the whole snapshot. Viewers still waiting
    /// on their own initial fetch are left alone.
    fn apply_snapshot(
        &mut self,
        seq: FetchSeq,
        graph: &Graph,
        bootstrap: Option<ConsumerId>,
    ) -> TickOutcome {
        let update = match self.tracker.generate_delta(graph) {
            Ok(update) => update,
            Err(e) => {
                tracing::error!("Failed to generate delta: {}", e);
                return TickOutcome::InvalidSnapshot(e);
            }
        };
        self.tracker_seq = seq;

        let wants_full = |id: ConsumerId, state: SyncState| match state {
            SyncState::NeedsFull => true,
            SyncState::AwaitingBootstrap => bootstrap == Some(id),
            SyncState::Synced => false,
        };

        let update_payload = update.as_ref().map(|u| u.to_json().map(Payload::from));
        let full = if self.consumers.iter().any(|(id, c)| wants_full(*id, c.state)) {
            match (&update, &update_payload) {
                (Some(u), Some(Ok(payload))) if u.is_full() => Some(Arc::clone(payload)),
                _ => full_payload(graph),
            }
        } else {
            None
        };

        let mut delivered = 0;
        let mut dropped = Vec::new();

        for (id, consumer) in self.consumers.iter_mut() {
            let payload = if wants_full(*id, consumer.state) {
                match &full {
                    Some(payload) => Arc::clone(payload),
                    None => continue,
                }
            } else if consumer.state == SyncState::Synced {
                match &update_payload {
                    None => continue,
                    Some(Ok(payload)) => Arc::clone(payload),
                    Some(Err(_)) => {
                        // Missed a delta, recover with a full sync
                        consumer.state = SyncState::NeedsFull;
                        continue;
                    }
                }
            } else {
                continue;
            };

            match consumer.queue.try_send(payload) {
                Ok(()) => {
                    consumer.state = SyncState::Synced;
                    delivered += 1;
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(client = id, "Client queue full, dropping slow client");
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(*id),
            }
        }

        for id in &dropped {
            self.consumers.remove(id);
        }
        if !dropped.is_empty() {
            tracing::info!("Dropped {} clients. Total clients: {}", dropped.len(), self.consumers.len());
        }

        match (update, update_payload) {
            (None, _) => TickOutcome::Unchanged,
            (Some(_), Some(Err(e))) => {
                tracing::warn!("Failed to marshal delta: {}", e);
                TickOutcome::SerializeFailed(e.to_string())
            }
            (Some(update), _) => {
                tracing::info!(
                    "Broadcast {:?} update to {} clients",
                    update.kind,
                    delivered
                );
                TickOutcome::Broadcast {
                    kind: update.kind,
                    delivered,
                    evicted: dropped.len(),
                }
            }
        }
    }

    fn set_state(&mut self, id: ConsumerId, state: SyncState) {
        if let Some(consumer) = self.consumers.get_mut(&id) {
            consumer.state = state;
        }
    }
}

/// Serialize a full sync of `graph`, or `None` if the graph is unusable
fn full_payload(graph: &Graph) -> Option<Payload> {
    let Some((nodes, links)) = graph.parts() else {
        tracing::error!("Collector returned a snapshot without node or link container");
        return None;
    };

    match DeltaUpdate::full(nodes.to_vec(), links.to_vec()).to_json() {
        Ok(json) => Some(json.into()),
        Err(e) => {
            tracing::warn!("Failed to marshal full update: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::StaticSource;
    use crate::types::{Link, Node};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn manual_config() -> HubConfig {
        HubConfig {
            poll_interval: Duration::from_secs(3600),
            ..HubConfig::default()
        }
    }

    fn graph_a() -> Graph {
        Graph::new(vec![Node::new("ns-default", "default", "namespace")], vec![])
    }

    fn graph_b() -> Graph {
        Graph::new(
            vec![
                Node::new("ns-default", "default", "namespace"),
                Node::new("pod-default-x", "x", "pod"),
            ],
            vec![Link::new("ns-default", "pod-default-x", "contains")],
        )
    }

    async fn next_update(rx: &mut mpsc::Receiver<Payload>) -> DeltaUpdate {
        let payload = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        serde_json::from_str(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_register_receives_full_immediately() {
        let source = Arc::new(StaticSource::new(graph_b()));
        let hub = Hub::spawn(source, manual_config());

        let (_, mut rx) = hub.register().await.unwrap();
        let update = next_update(&mut rx).await;
        assert!(update.is_full());
        assert_eq!(update.nodes.len(), 2);
        assert_eq!(update.links.len(), 1);
    }

    #[tokio::test]
    async fn test_no_polling_without_clients() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = move || -> CollectorResult<Graph> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(graph_a())
        };
        let hub = Hub::spawn(Arc::new(source), manual_config());

        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_broadcasts_delta() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source.clone(), manual_config());
        let (_, mut rx) = hub.register().await.unwrap();
        assert!(next_update(&mut rx).await.is_full());

        // The initial fetch already primed the tracker
        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Unchanged);
        assert_eq!(hub.stats().await.unwrap().previous_nodes, 1);

        source.set(graph_b());
        let outcome = hub.refresh().await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Broadcast {
                kind: UpdateKind::Delta,
                delivered: 1,
                evicted: 0
            }
        );

        let delta = next_update(&mut rx).await;
        assert_eq!(delta.nodes.len(), 1);
        assert_eq!(delta.nodes[0].id, "pod-default-x");
        assert_eq!(delta.links.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_client_is_evicted() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source.clone(), manual_config());

        let (_, mut fast) = hub.register().await.unwrap();
        let (_, mut slow) = hub.register_with_capacity(1).await.unwrap();
        next_update(&mut fast).await;
        next_update(&mut slow).await;

        source.set(graph_b());
        assert!(matches!(
            hub.refresh().await.unwrap(),
            TickOutcome::Broadcast { delivered: 2, evicted: 0, .. }
        ));
        next_update(&mut fast).await;
        // `slow` leaves that delta in its queue, filling it

        source.set(graph_a());
        let outcome = hub.refresh().await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Broadcast {
                kind: UpdateKind::Delta,
                delivered: 1,
                evicted: 1
            }
        );

        assert_eq!(next_update(&mut fast).await.removed_nodes, vec!["pod-default-x".to_string()]);
        assert_eq!(next_update(&mut slow).await.nodes.len(), 1);
        assert!(timeout(WAIT, slow.recv()).await.unwrap().is_none());
        assert_eq!(hub.stats().await.unwrap().connected_clients, 1);
    }

    #[tokio::test]
    async fn test_new_client_bootstrap_is_private() {
        let source = Arc::new(StaticSource::new(graph_b()));
        let hub = Hub::spawn(source, manual_config());

        let (_, mut a) = hub.register().await.unwrap();
        let (_, mut b) = hub.register().await.unwrap();
        next_update(&mut a).await;
        next_update(&mut b).await;

        let (_, mut c) = hub.register().await.unwrap();
        assert!(next_update(&mut c).await.is_full());

        // Round trip through the hub so any stray send would have happened
        assert_eq!(hub.stats().await.unwrap().connected_clients, 3);
        assert!(a.try_recv().is_err());
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_closes_queue() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source, manual_config());

        let (id, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;
        hub.unregister(id).await.unwrap();

        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
        assert_eq!(hub.stats().await.unwrap().connected_clients, 0);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = move || -> CollectorResult<Graph> {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            Ok(graph_a())
        };
        let hub = Hub::spawn(Arc::new(source), manual_config());
        let (_, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;

        let (first, second) = tokio::join!(hub.refresh(), hub.refresh());
        assert_eq!(first.unwrap(), second.unwrap());
        // one bootstrap fetch plus one tick fetch
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_transient() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source.clone(), manual_config());
        let (_, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;

        source.clear();
        assert!(matches!(hub.refresh().await.unwrap(), TickOutcome::FetchFailed(_)));

        source.set(graph_b());
        assert!(matches!(
            hub.refresh().await.unwrap(),
            TickOutcome::Broadcast { kind: UpdateKind::Delta, .. }
        ));
        assert_eq!(next_update(&mut rx).await.nodes[0].id, "pod-default-x");
    }

    #[tokio::test]
    async fn test_invalid_snapshot_reaches_caller() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source.clone(), manual_config());
        let (_, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;

        source.set(Graph {
            nodes: None,
            links: Some(Vec::new()),
        });
        assert!(matches!(
            hub.refresh().await.unwrap(),
            TickOutcome::InvalidSnapshot(DeltaError::InvalidSnapshot(_))
        ));
        assert_eq!(hub.stats().await.unwrap().connected_clients, 1);
    }

    #[tokio::test]
    async fn test_reset_tracker_forces_full_broadcast() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source, manual_config());
        let (_, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;

        hub.refresh().await.unwrap();
        assert_eq!(hub.stats().await.unwrap().previous_nodes, 1);
        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Unchanged);

        hub.reset_tracker().await.unwrap();
        assert!(matches!(
            hub.refresh().await.unwrap(),
            TickOutcome::Broadcast { kind: UpdateKind::Full, .. }
        ));
    }

    #[tokio::test]
    async fn test_timer_drives_polling() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let config = HubConfig {
            poll_interval: Duration::from_millis(20),
            ..HubConfig::default()
        };
        let hub = Hub::spawn(source.clone(), config);
        let (_, mut rx) = hub.register().await.unwrap();
        next_update(&mut rx).await;

        source.set(graph_b());
        let delta = next_update(&mut rx).await;
        assert_eq!(delta.kind, UpdateKind::Delta);
        assert_eq!(delta.removed_nodes.len(), 0);
    }

    #[tokio::test]
    async fn test_slow_initial_fetch_does_not_leave_viewer_behind() {
        let current = Arc::new(parking_lot::RwLock::new(graph_a()));
        let calls = Arc::new(AtomicUsize::new(0));
        let entered = Arc::new(tokio::sync::Notify::new());
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let gate = parking_lot::Mutex::new(Some(release_rx));

        let (graph, counter, signal) = (Arc::clone(&current), Arc::clone(&calls), Arc::clone(&entered));
        let source = move || -> CollectorResult<Graph> {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            let snapshot = graph.read().clone();
            // Third call is the second viewer's initial fetch; hold it until
            // a newer snapshot has gone out
            if call == 2 {
                signal.notify_one();
                if let Some(release) = gate.lock().take() {
                    let _ = release.recv();
                }
            }
            Ok(snapshot)
        };
        let hub = Hub::spawn(Arc::new(source), manual_config());

        let (_, mut a) = hub.register().await.unwrap();
        next_update(&mut a).await;
        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Unchanged);

        let (_, mut b) = hub.register().await.unwrap();
        timeout(WAIT, entered.notified()).await.unwrap();
        *current.write() = graph_b();

        // Only the synced viewer takes part in this delta
        assert_eq!(
            hub.refresh().await.unwrap(),
            TickOutcome::Broadcast {
                kind: UpdateKind::Delta,
                delivered: 1,
                evicted: 0
            }
        );
        assert_eq!(next_update(&mut a).await.kind, UpdateKind::Delta);
        assert!(b.try_recv().is_err());
        release_tx.send(()).unwrap();

        // The stale initial snapshot is refetched, so the first thing the
        // new viewer sees is the current graph
        let first = next_update(&mut b).await;
        assert!(first.is_full());
        assert_eq!(first.nodes.len(), 2);
        assert!(first.nodes.iter().any(|n| n.id == "pod-default-x"));

        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Unchanged);
        assert!(b.try_recv().is_err());
        assert!(a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_changed_graph_at_join_reaches_existing_viewers() {
        let source = Arc::new(StaticSource::new(graph_a()));
        let hub = Hub::spawn(source.clone(), manual_config());
        let (_, mut a) = hub.register().await.unwrap();
        next_update(&mut a).await;

        source.set(graph_b());
        let (_, mut b) = hub.register().await.unwrap();
        assert_eq!(next_update(&mut b).await.nodes.len(), 2);

        // `a` is brought to the same snapshot as `b`
        let delta = next_update(&mut a).await;
        assert_eq!(delta.kind, UpdateKind::Delta);
        assert_eq!(delta.nodes[0].id, "pod-default-x");
        assert_eq!(hub.refresh().await.unwrap(), TickOutcome::Unchanged);
    }
}
