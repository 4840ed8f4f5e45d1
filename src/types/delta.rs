//! Wire message carrying a full sync or a delta

use serde::{Deserialize, Serialize};

use super::{Link, LinkRef, Node};

/// Kind of update carried by a [`DeltaUpdate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Discard local state and adopt the carried graph
    Full,
    /// Difference from the previously emitted state
    Delta,
}

/// Update message sent to viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    /// Added or changed nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Added links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_links: Vec<LinkRef>,
}

impl DeltaUpdate {
    /// Create a full sync message
    pub fn full(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self {
            kind: UpdateKind::Full,
            nodes,
            links,
            removed_nodes: Vec::new(),
            removed_links: Vec::new(),
        }
    }

    /// Create an empty delta message
    pub fn delta() -> Self {
        Self {
            kind: UpdateKind::Delta,
            ..Self::full(Vec::new(), Vec::new())
        }
    }

    pub fn is_full(&self) -> bool {
        self.kind == UpdateKind::Full
    }

    /// Check if a delta carries no change at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.links.is_empty()
            && self.removed_nodes.is_empty()
            && self.removed_links.is_empty()
    }

    /// Serialize to the JSON wire format
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
