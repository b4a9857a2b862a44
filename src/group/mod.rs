//! Sequential group execution with progress reporting.

mod orchestrator;

pub use orchestrator::{GroupObserver, GroupOrchestrator, GroupSummary};
