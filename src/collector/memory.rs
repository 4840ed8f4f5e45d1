//! In-memory snapshot source

use parking_lot::RwLock;

use super::{CollectorError, CollectorResult, GraphSource};
use crate::types::Graph;

/// Serves whatever graph was last stored; an embedding application pushes
/// new graphs with [`set`](Self::set).
#[derive(Debug, Default)]
pub struct StaticSource {
    graph: RwLock<Option<Graph>>,
}

impl StaticSource {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: RwLock::new(Some(graph)),
        }
    }

    /// Replace the served graph
    pub fn set(&self, graph: Graph) {
        *self.graph.write() = Some(graph);
    }

    /// Make subsequent snapshots fail until the next [`set`](Self::set)
    pub fn clear(&self) {
        *self.graph.write() = None;
    }
}

impl GraphSource for StaticSource {
    fn snapshot(&self) -> CollectorResult<Graph> {
        self.graph
            .read()
            .clone()
            .ok_or_else(|| CollectorError::Unavailable("no graph stored".to_string()))
    }
}
