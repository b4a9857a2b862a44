//! Script execution: child-process lifecycle and terminal launching.
//!
//! - `ProcessRunner`: spawns scripts (plain or elevated), captures output,
//!   enforces timeouts
//! - `ExecutionResult`: structured outcome of one execution attempt
//! - `TerminalLauncher`: best-effort terminal-emulator integration

mod runner;
mod terminal;

pub use runner::{ExecutionResult, ProcessRunner};
pub use terminal::TerminalLauncher;
