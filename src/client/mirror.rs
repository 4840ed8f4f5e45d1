//! Local copy of the authoritative graph

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{DeltaUpdate, Graph, Link, LinkRef, Node, UpdateKind};

/// Mirror of the server's graph, kept in sync by applying updates in
/// arrival order.
///
/// Nodes and links keep the order in which they first appeared, so an
/// in-place node update never moves it.
#[derive(Debug, Clone, Default)]
pub struct GraphMirror {
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Node id -> position in `nodes`
    index: HashMap<String, usize>,
    link_keys: HashSet<LinkRef>,
}

#[derive(Serialize)]
struct MirrorView<'a> {
    nodes: &'a [Node],
    links: &'a [Link],
}

impl GraphMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains_link(&self, key: &LinkRef) -> bool {
        self.link_keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Copy of the mirrored state as a graph snapshot
    pub fn to_graph(&self) -> Graph {
        Graph::new(self.nodes.clone(), self.links.clone())
    }

    /// Apply an update received from the server
    pub fn apply(&mut self, update: DeltaUpdate) {
        match update.kind {
            UpdateKind::Full => self.replace(update.nodes, update.links),
            UpdateKind::Delta => self.apply_delta(update),
        }
    }

    /// Discard everything and adopt the given collections
    pub fn replace(&mut self, nodes: Vec<Node>, links: Vec<Link>) {
        self.nodes = nodes;
        self.links = links;
        self.reindex();
    }

    /// Check whether the mirror would serialize to exactly the same bytes
    /// as the given collections
    pub fn is_identical(&self, nodes: &[Node], links: &[Link]) -> bool {
        let current = serde_json::to_vec(&MirrorView {
            nodes: &self.nodes,
            links: &self.links,
        });
        let incoming = serde_json::to_vec(&MirrorView { nodes, links });

        match (current, incoming) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn apply_delta(&mut self, update: DeltaUpdate) {
        // 1. Removed nodes, cascading to every link touching them
        if !update.removed_nodes.is_empty() {
            let removed: HashSet<&str> = update.removed_nodes.iter().map(String::as_str).collect();
            self.nodes.retain(|n| !removed.contains(n.id.as_str()));
            self.links
                .retain(|l| !removed.contains(l.source.as_str()) && !removed.contains(l.target.as_str()));
        }

        // 2. Explicitly removed links
        if !update.removed_links.is_empty() {
            let removed: HashSet<&LinkRef> = update.removed_links.iter().collect();
            self.links.retain(|l| !removed.contains(&l.key()));
        }

        if !update.removed_nodes.is_empty() || !update.removed_links.is_empty() {
            self.reindex();
        }

        // 3. Upsert nodes
        for node in update.nodes {
            match self.index.get(&node.id) {
                Some(&i) => self.nodes[i].merge_from(node),
                None => {
                    self.index.insert(node.id.clone(), self.nodes.len());
                    self.nodes.push(node);
                }
            }
        }

        // 4. Append links not already present
        for link in update.links {
            if self.link_keys.insert(link.key()) {
                self.links.push(link);
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.link_keys = self.links.iter().map(Link::key).collect();
    }
}
