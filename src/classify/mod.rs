//! Heuristic privilege classification for shell scripts.
//!
//! Pattern tables are data (`patterns`); the classifier applies them to
//! script text and aggregates results. This is a usability heuristic, not a
//! security boundary.

mod classifier;
mod patterns;

pub use classifier::{ClassificationSummary, PrivilegeClassifier};
pub use patterns::{ElevationCategory, SuppressionCategory};
