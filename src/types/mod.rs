//! Data types for graph synchronization
//!
//! This module contains the graph snapshot model shared by the server-side
//! delta tracker and the client-side reconciler, plus the wire message.

mod delta;
mod graph;
mod link;
mod node;
mod resource_info;

pub use delta::{DeltaUpdate, UpdateKind};
pub use graph::Graph;
pub use link::{Link, LinkRef};
pub use node::{Node, StringMap};
pub use resource_info::{InfoValue, ResourceInfo, ORDER_INSENSITIVE_KEYS};

use serde::{Deserialize, Deserializer};

/// Result type for process-level plumbing
pub type SyncResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Deserialize a JSON `null` as the type's default value (for maps the
/// collector may emit as null)
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &i64) -> bool {
    *val == 0
}
