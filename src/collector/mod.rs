//! Graph snapshot sources
//!
//! The hub treats the collector as an opaque synchronous call that either
//! yields one full [`Graph`] or fails. Calls may be slow and are made
//! repeatedly on a timer, so the hub runs them on the blocking pool.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::StaticSource;

use crate::types::Graph;

/// Result type for collector operations
pub type CollectorResult<T> = Result<T, CollectorError>;

/// Errors a snapshot source can report. All of them are retryable.
#[derive(Debug)]
pub enum CollectorError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Unavailable(String),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::Io(e) => write!(f, "IO error: {}", e),
            CollectorError::Parse(e) => write!(f, "Parse error: {}", e),
            CollectorError::Unavailable(msg) => write!(f, "Source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectorError::Io(e) => Some(e),
            CollectorError::Parse(e) => Some(e),
            CollectorError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(e: std::io::Error) -> Self {
        CollectorError::Io(e)
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(e: serde_json::Error) -> Self {
        CollectorError::Parse(e)
    }
}

/// Produces full graph snapshots on demand
pub trait GraphSource: Send + Sync + 'static {
    /// Build one immutable snapshot of the current graph
    fn snapshot(&self) -> CollectorResult<Graph>;
}

impl<F> GraphSource for F
where
    F: Fn() -> CollectorResult<Graph> + Send + Sync + 'static,
{
    fn snapshot(&self) -> CollectorResult<Graph> {
        self()
    }
}
