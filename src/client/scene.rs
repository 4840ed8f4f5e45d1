//! Minimal scene mutations between two visible graphs

use crate::types::{Link, LinkRef, Node};

use super::VisibleGraph;

/// Partition of the changes between the previously rendered view and the
/// new one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDiff {
    pub added_nodes: Vec<Node>,
    /// Nodes present in both views whose attributes changed
    pub updated_nodes: Vec<Node>,
    pub removed_nodes: Vec<String>,
    pub added_links: Vec<Link>,
    pub removed_links: Vec<LinkRef>,
}

impl SceneDiff {
    /// Compare two views by node id and link key.
    ///
    /// A link whose relationship changed under the same key is reported as
    /// removed and re-added so the scene never shows a stale label.
    pub fn between(prev: &VisibleGraph, next: &VisibleGraph) -> Self {
        let mut diff = SceneDiff::default();

        let prev_nodes = prev.node_map();
        let next_nodes = next.node_map();

        for node in &next.nodes {
            match prev_nodes.get(node.id.as_str()) {
                None => diff.added_nodes.push(node.clone()),
                Some(old) if *old != node => diff.updated_nodes.push(node.clone()),
                Some(_) => {}
            }
        }
        for node in &prev.nodes {
            if !next_nodes.contains_key(node.id.as_str()) {
                diff.removed_nodes.push(node.id.clone());
            }
        }

        let prev_links = prev.link_map();
        let next_links = next.link_map();

        for link in &next.links {
            let key = link.key();
            match prev_links.get(&key) {
                None => diff.added_links.push(link.clone()),
                Some(old) if old.relationship != link.relationship => {
                    diff.removed_links.push(key);
                    diff.added_links.push(link.clone());
                }
                Some(_) => {}
            }
        }
        for link in &prev.links {
            let key = link.key();
            if !next_links.contains_key(&key) {
                diff.removed_links.push(key);
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.updated_nodes.is_empty() && !self.is_structural()
    }

    /// Check whether the diff adds or removes anything
    pub fn is_structural(&self) -> bool {
        !self.added_nodes.is_empty()
            || !self.removed_nodes.is_empty()
            || !self.added_links.is_empty()
            || !self.removed_links.is_empty()
    }

    /// Turn the diff into the cheapest scene update that applies it
    pub fn into_update(self) -> Option<SceneUpdate> {
        if self.is_structural() {
            Some(SceneUpdate::Topology(self))
        } else if !self.updated_nodes.is_empty() {
            Some(SceneUpdate::Properties(self.updated_nodes))
        } else {
            None
        }
    }
}

/// Change notification delivered to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SceneUpdate {
    /// Only attributes of existing nodes changed; patch them in place
    /// without touching layout
    Properties(Vec<Node>),
    /// Nodes or links were added or removed
    Topology(SceneDiff),
}

impl SceneUpdate {
    pub fn is_structural(&self) -> bool {
        matches!(self, SceneUpdate::Topology(_))
    }
}

/// Receiver of scene updates
pub trait SceneListener {
    fn on_scene_update(&mut self, update: &SceneUpdate);
}

impl<F> SceneListener for F
where
    F: FnMut(&SceneUpdate),
{
    fn on_scene_update(&mut self, update: &SceneUpdate) {
        self(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(nodes: Vec<Node>, links: Vec<Link>) -> VisibleGraph {
        VisibleGraph { nodes, links }
    }

    #[test]
    fn test_identical_views() {
        let a = view(
            vec![Node::new("a", "a", "pod"), Node::new("b", "b", "pod")],
            vec![Link::new("a", "b", "talks")],
        );
        let diff = SceneDiff::between(&a, &a.clone());

        assert!(diff.is_empty());
        assert!(diff.into_update().is_none());
    }

    #[test]
    fn test_property_only_change() {
        let prev = view(vec![Node::new("a", "a", "pod")], vec![]);
        let next = view(vec![Node::new("a", "a", "pod").with_status("Failed")], vec![]);

        let diff = SceneDiff::between(&prev, &next);
        assert!(!diff.is_structural());

        match diff.into_update() {
            Some(SceneUpdate::Properties(nodes)) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].status, "Failed");
            }
            other => panic!("expected property update, got {:?}", other),
        }
    }

    #[test]
    fn test_structural_change() {
        let prev = view(
            vec![Node::new("a", "a", "pod"), Node::new("b", "b", "pod")],
            vec![Link::new("a", "b", "talks")],
        );
        let next = view(
            vec![Node::new("a", "a", "pod").with_status("Running"), Node::new("c", "c", "pod")],
            vec![],
        );

        let diff = SceneDiff::between(&prev, &next);
        assert_eq!(diff.added_nodes.len(), 1);
        assert_eq!(diff.updated_nodes.len(), 1);
        assert_eq!(diff.removed_nodes, vec!["b".to_string()]);
        assert_eq!(diff.removed_links, vec![LinkRef::new("a", "b")]);

        let update = diff.into_update().unwrap();
        assert!(update.is_structural());
    }

    #[test]
    fn test_relationship_change_replaces_link() {
        let nodes = vec![Node::new("a", "a", "pod"), Node::new("b", "b", "pod")];
        let prev = view(nodes.clone(), vec![Link::new("a", "b", "talks")]);
        let next = view(nodes, vec![Link::new("a", "b", "owns")]);

        let diff = SceneDiff::between(&prev, &next);
        assert_eq!(diff.removed_links, vec![LinkRef::new("a", "b")]);
        assert_eq!(diff.added_links[0].relationship, "owns");
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut listener = |u: &SceneUpdate| seen.push(u.is_structural());
            listener.on_scene_update(&SceneUpdate::Properties(vec![]));
        }
        assert_eq!(seen, vec![false]);
    }
}
