//! Utility functions and helpers
//!
//! This module contains timestamp and resource age helpers.

pub mod time;

pub use time::{age_from_rfc3339, format_age, UNKNOWN_AGE};
