//! Link types for the cluster graph

use serde::{Deserialize, Serialize};

use super::is_zero;

/// Directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    /// Unused by the viewer, kept for wire compatibility
    #[serde(default, skip_serializing_if = "is_zero")]
    pub value: i64,
    #[serde(default)]
    pub relationship: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value: 0,
            relationship: relationship.into(),
        }
    }

    /// Identity of this link for diffing
    pub fn key(&self) -> LinkRef {
        LinkRef {
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }

    /// Check whether this link has the given identity without allocating
    pub fn has_key(&self, key: &LinkRef) -> bool {
        self.source == key.source && self.target == key.target
    }

    /// Check whether either endpoint is the given node id
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Link identity: the ordered `(source, target)` pair.
///
/// The relationship is not part of the identity. Kept as a structured pair
/// so ids containing separators can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkRef {
    pub source: String,
    pub target: String,
}

impl LinkRef {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl std::fmt::Display for LinkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
