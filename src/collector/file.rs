//! File-backed snapshot source

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{CollectorResult, GraphSource};
use crate::types::Graph;
use crate::utils::time::age_from_rfc3339;

/// Reads a JSON graph (`{"nodes": [...], "links": [...]}`) on every snapshot.
///
/// Node ages are recomputed from `creationtime` at read time, so the file
/// only needs stable timestamps.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphSource for FileSource {
    fn snapshot(&self) -> CollectorResult<Graph> {
        let content = fs::read_to_string(&self.path)?;
        let mut graph: Graph = serde_json::from_str(&content)?;

        let now = Utc::now();
        for node in graph.nodes.iter_mut().flatten() {
            node.age = age_from_rfc3339(&node.creation_time, now);
        }

        Ok(graph)
    }
}
