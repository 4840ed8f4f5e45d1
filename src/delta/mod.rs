//! Delta Tracker - snapshot diff engine
//!
//! Converts successive full graph snapshots into minimal change sets:
//!
//! ```text
//! snapshot ──► DeltaTracker::generate_delta ──► None        (nothing changed)
//!                     │                    └──► Some(full)  (first snapshot)
//!                     ▼                    └──► Some(delta) (difference)
//!              previous state (replaced after every call)
//! ```

mod tracker;

pub use tracker::{DeltaError, DeltaResult, DeltaTracker, TrackerOptions, TrackerStats};
