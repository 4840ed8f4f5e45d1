//! Node type for the cluster graph

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{null_as_default, ResourceInfo};

/// String-to-string mapping used for labels and annotations
pub type StringMap = BTreeMap<String, String>;

/// A cluster resource in the graph
///
/// `id` is stable across snapshots for the same resource. `age` is derived
/// from `creation_time` by the collector on every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "statusmessage", default)]
    pub status_message: String,
    #[serde(rename = "creationtime", default)]
    pub creation_time: String,
    #[serde(default)]
    pub age: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: StringMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: StringMap,
    #[serde(rename = "resourceinfo", default, deserialize_with = "null_as_default")]
    pub resource_info: ResourceInfo,
}

impl Node {
    /// Create a new node with the given id, name and type
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    /// Set the namespace (builder style)
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the status (builder style)
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Equality that optionally ignores the derived `age` field.
    pub fn same_as(&self, other: &Node, compare_age: bool) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.node_type == other.node_type
            && self.namespace == other.namespace
            && self.status == other.status
            && self.status_message == other.status_message
            && self.creation_time == other.creation_time
            && (!compare_age || self.age == other.age)
            && self.labels == other.labels
            && self.annotations == other.annotations
            && self.resource_info == other.resource_info
    }

    /// Overwrite every attribute with `other`'s in place.
    ///
    /// The node keeps its identity and its slot in whatever collection
    /// holds it.
    pub fn merge_from(&mut self, other: Node) {
        let Node {
            id: _,
            name,
            node_type,
            namespace,
            status,
            status_message,
            creation_time,
            age,
            labels,
            annotations,
            resource_info,
        } = other;

        self.name = name;
        self.node_type = node_type;
        self.namespace = namespace;
        self.status = status;
        self.status_message = status_message;
        self.creation_time = creation_time;
        self.age = age;
        self.labels = labels;
        self.annotations = annotations;
        self.resource_info = resource_info;
    }
}
