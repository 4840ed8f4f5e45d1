//! Graph snapshot container type

use serde::{Deserialize, Serialize};

use super::{Link, Node};

/// One full snapshot of the cluster graph.
///
/// Containers are optional so an absent collection (a broken collector)
/// stays distinguishable from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
    #[serde(default)]
    pub links: Option<Vec<Link>>,
}

impl Graph {
    /// Create a graph with both containers present
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self {
            nodes: Some(nodes),
            links: Some(links),
        }
    }

    /// Create an empty graph with both containers present
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Borrow both containers, or `None` if either is absent
    pub fn parts(&self) -> Option<(&[Node], &[Link])> {
        match (&self.nodes, &self.links) {
            (Some(nodes), Some(links)) => Some((nodes, links)),
            _ => None,
        }
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, Vec::len)
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.as_ref().map_or(0, Vec::len)
    }
}
