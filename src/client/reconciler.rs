//! Applies server messages to the mirror and keeps the rendered view in step

use crate::types::DeltaUpdate;

use super::{GraphMirror, SceneDiff, SceneListener, ViewFilter, VisibleGraph};

/// Result type for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that can occur while handling a server message
#[derive(Debug)]
pub enum ReconcileError {
    /// The message was not a valid update. Transient: the mirror is untouched.
    Parse(serde_json::Error),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::Parse(e) => write!(f, "Failed to parse update: {}", e),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Parse(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(e: serde_json::Error) -> Self {
        ReconcileError::Parse(e)
    }
}

/// Viewer-side state: the mirror, the active filter and the view last
/// handed to the listener.
///
/// Updates must be fed in the order they arrived on one connection.
pub struct Reconciler<L> {
    mirror: GraphMirror,
    filter: ViewFilter,
    visible: VisibleGraph,
    listener: L,
}

impl<L: SceneListener> Reconciler<L> {
    pub fn new(listener: L) -> Self {
        Self::with_filter(ViewFilter::default(), listener)
    }

    pub fn with_filter(filter: ViewFilter, listener: L) -> Self {
        Self {
            mirror: GraphMirror::new(),
            filter,
            visible: VisibleGraph::default(),
            listener,
        }
    }

    pub fn mirror(&self) -> &GraphMirror {
        &self.mirror
    }

    pub fn visible(&self) -> &VisibleGraph {
        &self.visible
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Parse and apply one text frame.
    ///
    /// Returns whether the visible scene changed.
    pub fn handle_text(&mut self, text: &str) -> ReconcileResult<bool> {
        let update: DeltaUpdate = serde_json::from_str(text)?;
        Ok(self.handle_update(update))
    }

    /// Apply one update. Returns whether the visible scene changed.
    pub fn handle_update(&mut self, update: DeltaUpdate) -> bool {
        if update.is_full() && self.mirror.is_identical(&update.nodes, &update.links) {
            tracing::debug!("Full sync matches mirror, skipping");
            return false;
        }

        self.mirror.apply(update);
        self.refresh_view()
    }

    /// Replace the filter and re-derive the view
    pub fn set_filter(&mut self, filter: ViewFilter) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.refresh_view()
    }

    fn refresh_view(&mut self) -> bool {
        let next = self.filter.apply(&self.mirror);
        let diff = SceneDiff::between(&self.visible, &next);
        self.visible = next;

        match diff.into_update() {
            Some(update) => {
                self.listener.on_scene_update(&update);
                true
            }
            None => false,
        }
    }
}
