//! Visibility filtering of the mirrored graph

use std::collections::{HashMap, HashSet};

use crate::types::{Link, LinkRef, Node};

use super::GraphMirror;

/// Node types and relationships the viewer has chosen to hide
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub hidden_types: HashSet<String>,
    pub hidden_relationships: HashSet<String>,
}

impl ViewFilter {
    /// Filter that shows everything
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_type(mut self, node_type: impl Into<String>) -> Self {
        self.hidden_types.insert(node_type.into());
        self
    }

    pub fn hide_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.hidden_relationships.insert(relationship.into());
        self
    }

    /// Derive the visible subgraph of a mirror.
    ///
    /// A link is visible only when its relationship is not hidden and both
    /// of its endpoints are visible nodes.
    pub fn apply(&self, mirror: &GraphMirror) -> VisibleGraph {
        let nodes: Vec<Node> = mirror
            .nodes()
            .iter()
            .filter(|n| !self.hidden_types.contains(&n.node_type))
            .cloned()
            .collect();

        let visible_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        let links = mirror
            .links()
            .iter()
            .filter(|l| {
                !self.hidden_relationships.contains(&l.relationship)
                    && visible_ids.contains(l.source.as_str())
                    && visible_ids.contains(l.target.as_str())
            })
            .cloned()
            .collect();

        VisibleGraph { nodes, links }
    }
}

/// The nodes and links currently shown to the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl VisibleGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_link(&self, key: &LinkRef) -> bool {
        self.links.iter().any(|l| l.has_key(key))
    }

    pub(crate) fn node_map(&self) -> HashMap<&str, &Node> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    pub(crate) fn link_map(&self) -> HashMap<LinkRef, &Link> {
        self.links.iter().map(|l| (l.key(), l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeltaUpdate;

    fn mirror() -> GraphMirror {
        let mut mirror = GraphMirror::new();
        mirror.apply(DeltaUpdate::full(
            vec![
                Node::new("ns-default", "default", "namespace"),
                Node::new("pod-a", "a", "pod"),
                Node::new("svc-a", "a", "service"),
            ],
            vec![
                Link::new("ns-default", "pod-a", "contains"),
                Link::new("ns-default", "svc-a", "contains"),
                Link::new("svc-a", "pod-a", "exposes"),
            ],
        ));
        mirror
    }

    #[test]
    fn test_empty_filter_shows_everything() {
        let visible = ViewFilter::new().apply(&mirror());
        assert_eq!(visible.nodes.len(), 3);
        assert_eq!(visible.links.len(), 3);
    }

    #[test]
    fn test_hidden_type_drops_attached_links() {
        let visible = ViewFilter::new().hide_type("service").apply(&mirror());

        assert_eq!(visible.nodes.len(), 2);
        assert!(visible.node("svc-a").is_none());
        assert_eq!(visible.links.len(), 1);
        assert!(visible.contains_link(&LinkRef::new("ns-default", "pod-a")));
    }

    #[test]
    fn test_hidden_relationship() {
        let visible = ViewFilter::new().hide_relationship("contains").apply(&mirror());

        assert_eq!(visible.nodes.len(), 3);
        assert_eq!(visible.links.len(), 1);
        assert!(visible.contains_link(&LinkRef::new("svc-a", "pod-a")));
    }

    #[test]
    fn test_dangling_link_not_visible() {
        let mut mirror = mirror();
        let mut delta = DeltaUpdate::delta();
        delta.links.push(Link::new("pod-a", "pod-missing", "talks"));
        mirror.apply(delta);

        assert_eq!(mirror.links().len(), 4);
        assert_eq!(ViewFilter::new().apply(&mirror).links.len(), 3);
    }
}
