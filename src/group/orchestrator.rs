use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{ScriptCatalogEntry, ScriptGroup};
use crate::config::ExecutionConfig;
use crate::exec::{ExecutionResult, ProcessRunner, TerminalLauncher};

/// Receives progress while a group runs. All callbacks are fire-and-forget
/// from the orchestrator's point of view; implementations must not block.
pub trait GroupObserver: Send + Sync {
    /// Called before each item runs. `index` is zero-based.
    fn on_progress(&self, index: usize, total: usize, name: &str);

    /// Called after each item with its result.
    fn on_item_done(&self, entry: &ScriptCatalogEntry, result: &ExecutionResult);

    /// Called exactly once when the group run ends, including early stops
    /// and empty groups.
    fn on_group_done(&self, summary: &GroupSummary);
}

/// Aggregate outcome of a group run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// True when a failure stopped the run with items still pending.
    pub stopped_early: bool,
    pub message: String,
    /// Wall-clock time for the whole group run.
    pub duration_ms: u64,
}

/// Runs the members of a script group one at a time, in list order.
///
/// Two modes with deliberately different failure policies: in-process runs
/// stop at the first failing script, terminal launches always walk the
/// whole list and only count failures (a window that failed to open says
/// nothing about the scripts still to come).
pub struct GroupOrchestrator {
    runner: ProcessRunner,
    launcher: TerminalLauncher,
    launch_delay: Duration,
}

impl GroupOrchestrator {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            runner: ProcessRunner::new(config),
            launcher: TerminalLauncher::new(config),
            launch_delay: Duration::from_millis(config.terminal_delay_ms),
        }
    }

    /// Run every member in order, stopping at the first failure.
    pub async fn run_sequential(
        &self,
        group: &ScriptGroup,
        observer: &dyn GroupObserver,
    ) -> GroupSummary {
        let started = Instant::now();
        let total = group.scripts.len();
        let mut succeeded = 0;
        let mut failed = 0;
        let mut stopped_early = false;
        let mut message = String::from("Group execution completed");

        for (index, entry) in group.scripts.iter().enumerate() {
            observer.on_progress(index, total, &entry.name);
            info!(
                group = %group.name,
                script = %entry.name,
                position = index + 1,
                total,
                "Executing"
            );

            let result = self.runner.run(entry).await;
            let success = result.success;
            observer.on_item_done(entry, &result);

            if success {
                succeeded += 1;
            } else {
                failed += 1;
                stopped_early = index + 1 < total;
                message = format!("Script failed: {}", entry.name);
                warn!(group = %group.name, script = %entry.name, "Stopping group run");
                break;
            }
        }

        let summary = GroupSummary {
            total,
            succeeded,
            failed,
            stopped_early,
            message,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        observer.on_group_done(&summary);
        summary
    }

    /// Open every member in its own terminal window, pausing between
    /// launches. Launch failures are counted, not fatal.
    pub async fn run_sequential_in_terminals(
        &self,
        group: &ScriptGroup,
        secret: Option<&str>,
        observer: &dyn GroupObserver,
    ) -> GroupSummary {
        let started = Instant::now();
        let total = group.scripts.len();
        let mut opened = 0;
        let mut failed = 0;

        for (index, entry) in group.scripts.iter().enumerate() {
            observer.on_progress(index, total, &entry.name);
            info!(
                group = %group.name,
                script = %entry.name,
                position = index + 1,
                total,
                "Opening terminal"
            );

            let result = match self.launcher.launch(entry, secret).await {
                Ok(()) => {
                    opened += 1;
                    ExecutionResult::completed(
                        0,
                        format!("Terminal opened for: {}", entry.name),
                        String::new(),
                    )
                }
                Err(e) => {
                    failed += 1;
                    warn!(script = %entry.name, error = %e, "Terminal launch failed");
                    ExecutionResult::failure(e.to_string())
                }
            };
            observer.on_item_done(entry, &result);

            if index + 1 < total {
                tokio::time::sleep(self.launch_delay).await;
            }
        }

        let summary = GroupSummary {
            total,
            succeeded: opened,
            failed,
            stopped_early: false,
            message: format!(
                "Group execution completed ({} terminals opened, {} failed)",
                opened, failed
            ),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        observer.on_group_done(&summary);
        summary
    }
}
