//! Stateful snapshot comparison

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{DeltaUpdate, Graph, Link, LinkRef, Node};

/// Result type for DeltaTracker operations
pub type DeltaResult<T> = Result<T, DeltaError>;

/// Errors that can occur while generating a delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// The snapshot's node or link container is absent.
    ///
    /// This is a collector bug, retrying the same call will not help.
    InvalidSnapshot(String),
}

impl std::fmt::Display for DeltaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeltaError::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {}", msg),
        }
    }
}

impl std::error::Error for DeltaError {}

/// Tuning knobs for the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Whether the derived `age` field participates in node equality.
    ///
    /// When enabled, nodes whose age string ticks over are reported as
    /// changed, which acts as a liveness heartbeat for viewers.
    pub compare_age: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self { compare_age: true }
    }
}

/// Counts of tracked state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub previous_nodes: usize,
    pub previous_links: usize,
}

/// Previous snapshot, keyed for lookup
#[derive(Debug, Default)]
struct PreviousState {
    nodes: HashMap<String, Node>,
    links: HashMap<LinkRef, Link>,
}

/// Tracks the last snapshot and diffs new snapshots against it
#[derive(Debug, Default)]
pub struct DeltaTracker {
    options: TrackerOptions,
    previous: Option<PreviousState>,
}

impl DeltaTracker {
    /// Create a tracker with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with custom options
    pub fn with_options(options: TrackerOptions) -> Self {
        Self {
            options,
            previous: None,
        }
    }

    pub fn options(&self) -> TrackerOptions {
        self.options
    }

    /// Compare `graph` with the previous snapshot.
    ///
    /// Returns `Ok(None)` when nothing changed. The first snapshot after
    /// construction or [`reset`](Self::reset) always yields a full update.
    /// The previous state is replaced with `graph` on every successful call.
    pub fn generate_delta(&mut self, graph: &Graph) -> DeltaResult<Option<DeltaUpdate>> {
        let (nodes, links) = graph.parts().ok_or_else(|| {
            DeltaError::InvalidSnapshot(format!(
                "missing {} container",
                if graph.nodes.is_none() { "node" } else { "link" }
            ))
        })?;

        let current = PreviousState {
            nodes: nodes.iter().map(|n| (n.id.clone(), n.clone())).collect(),
            links: links.iter().map(|l| (l.key(), l.clone())).collect(),
        };

        let Some(previous) = self.previous.replace(current) else {
            tracing::info!(
                nodes = nodes.len(),
                links = links.len(),
                "First snapshot, emitting full update"
            );
            return Ok(Some(DeltaUpdate::full(nodes.to_vec(), links.to_vec())));
        };

        let delta = self.diff(&previous, nodes, links);
        if delta.is_empty() {
            return Ok(None);
        }

        tracing::info!(
            "Generated delta: +{} nodes, +{} links, -{} nodes, -{} links",
            delta.nodes.len(),
            delta.links.len(),
            delta.removed_nodes.len(),
            delta.removed_links.len()
        );

        Ok(Some(delta))
    }

    fn diff(&self, previous: &PreviousState, nodes: &[Node], links: &[Link]) -> DeltaUpdate {
        let mut delta = DeltaUpdate::delta();

        // Duplicate ids collapse to their last occurrence
        let last_node: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        for (i, node) in nodes.iter().enumerate() {
            if last_node[node.id.as_str()] != i {
                continue;
            }
            let changed = match previous.nodes.get(&node.id) {
                None => true,
                Some(prev) => !prev.same_as(node, self.options.compare_age),
            };
            if changed {
                delta.nodes.push(node.clone());
            }
        }

        delta.removed_nodes = previous
            .nodes
            .keys()
            .filter(|id| !last_node.contains_key(id.as_str()))
            .cloned()
            .collect();
        delta.removed_nodes.sort();

        let last_link: HashMap<LinkRef, usize> = links
            .iter()
            .enumerate()
            .map(|(i, l)| (l.key(), i))
            .collect();
        for (i, link) in links.iter().enumerate() {
            let key = link.key();
            if last_link[&key] == i && !previous.links.contains_key(&key) {
                delta.links.push(link.clone());
            }
        }

        delta.removed_links = previous
            .links
            .keys()
            .filter(|key| !last_link.contains_key(*key))
            .cloned()
            .collect();
        delta.removed_links.sort();

        delta
    }

    /// Discard the previous snapshot; the next call emits a full update
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Check whether a previous snapshot is held
    pub fn has_state(&self) -> bool {
        self.previous.is_some()
    }

    /// Get counts of the tracked previous snapshot
    pub fn stats(&self) -> TrackerStats {
        self.previous
            .as_ref()
            .map(|p| TrackerStats {
                previous_nodes: p.nodes.len(),
                previous_links: p.links.len(),
            })
            .unwrap_or_default()
    }
}
