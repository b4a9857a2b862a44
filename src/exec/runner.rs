use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::catalog::{is_executable, ScriptCatalogEntry};
use crate::classify::PrivilegeClassifier;
use crate::config::ExecutionConfig;
use crate::sudo::{CredentialBroker, SecretPrompt};

/// Outcome of one execution attempt.
///
/// `exit_code` is -1 when the script never ran to completion: precondition
/// failures, spawn errors, and timeouts all land there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub(crate) fn completed(exit_code: i32, output: String, error: String) -> Self {
        Self {
            success: exit_code == 0,
            output,
            error,
            exit_code,
            duration_ms: 0,
        }
    }

    pub(crate) fn failure(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: message,
            exit_code: -1,
            duration_ms: 0,
        }
    }

    fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Runs catalog scripts as child processes.
///
/// Plain runs are capped at `timeout_secs`; on expiry the child is killed
/// and whatever output was captured so far is kept. Elevated runs go through
/// `sudo -S` with the broker's validated secret on stdin and default to no
/// ceiling, since privileged scripts routinely outlive 30 seconds.
pub struct ProcessRunner {
    plain_timeout: Duration,
    elevated_timeout: Option<Duration>,
    classifier: PrivilegeClassifier,
}

impl ProcessRunner {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            plain_timeout: Duration::from_secs(config.timeout_secs),
            elevated_timeout: (config.elevated_timeout_secs > 0)
                .then(|| Duration::from_secs(config.elevated_timeout_secs)),
            classifier: PrivilegeClassifier::new(),
        }
    }

    /// Run a script without elevation.
    pub async fn run(&self, entry: &ScriptCatalogEntry) -> ExecutionResult {
        self.run_with(entry, None).await
    }

    /// Run a script with elevation, acquiring a credential first.
    ///
    /// Scripts the classifier does not flag are run plain; the prompt is
    /// never shown for them. A cancelled or failed credential acquisition
    /// produces a failure result without spawning anything.
    pub async fn run_elevated(
        &self,
        entry: &ScriptCatalogEntry,
        broker: &CredentialBroker,
        prompt: &dyn SecretPrompt,
    ) -> ExecutionResult {
        if !self.classifier.requires_elevation(entry) {
            debug!(script = %entry.name, "No elevated commands detected, running plain");
            return self.run(entry).await;
        }

        let reason = format!("Execute script: {}", entry.name);
        if !broker.ensure_credential(&reason, prompt).await {
            return ExecutionResult::failure(format!(
                "Sudo password required to execute: {}",
                entry.name
            ));
        }
        let Some(secret) = broker.secret_if_validated() else {
            return ExecutionResult::failure(format!(
                "Sudo password required to execute: {}",
                entry.name
            ));
        };

        self.run_with(entry, Some(&secret)).await
    }

    /// Set the executable bit (rwxr-xr-x) on a script. Best effort: failures
    /// are logged and reported through the return value, never raised.
    pub fn make_executable(&self, entry: &mut ScriptCatalogEntry) -> bool {
        match set_executable(&entry.file_path) {
            Ok(()) => {
                debug!(script = %entry.name, "Marked executable");
                entry.executable = true;
                true
            }
            Err(e) => {
                warn!(script = %entry.name, error = %e, "Could not mark script executable");
                false
            }
        }
    }

    async fn run_with(&self, entry: &ScriptCatalogEntry, secret: Option<&str>) -> ExecutionResult {
        let path = &entry.file_path;
        if !path.exists() {
            return ExecutionResult::failure(format!("Script file not found: {}", path.display()));
        }
        if !is_executable(path) {
            return ExecutionResult::failure(format!(
                "Script is not executable: {}",
                path.display()
            ));
        }

        let working_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut command = match secret {
            Some(_) => {
                let mut c = Command::new("sudo");
                c.arg("-S").arg("bash").arg(path);
                c.stdin(Stdio::piped());
                c
            }
            None => {
                let mut c = Command::new("bash");
                c.arg(path);
                c.stdin(Stdio::null());
                c
            }
        };
        command
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(script = %entry.name, elevated = secret.is_some(), "Executing script");
        let start = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult::failure(format!("Execution error: {}", e))
                    .with_duration(start.elapsed().as_millis() as u64);
            }
        };

        if let Some(secret) = secret
            && let Some(mut stdin) = child.stdin.take()
        {
            if let Err(e) = stdin.write_all(format!("{}\n", secret).as_bytes()).await {
                warn!(script = %entry.name, error = %e, "Could not write credential to stdin");
            }
            // stdin drops here, closing the pipe so sudo stops waiting
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut output = String::new();
        let mut error = String::new();

        let ceiling = match secret {
            Some(_) => self.elevated_timeout,
            None => Some(self.plain_timeout),
        };

        let waited = match ceiling {
            Some(limit) => {
                timeout(
                    limit,
                    collect_and_wait(&mut child, stdout, stderr, &mut output, &mut error),
                )
                .await
            }
            None => Ok(collect_and_wait(&mut child, stdout, stderr, &mut output, &mut error).await),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match waited {
            Ok(Ok(status)) => {
                let exit_code = status.code().unwrap_or(-1);
                debug!(
                    script = %entry.name,
                    exit_code,
                    duration_ms,
                    "Script finished"
                );
                ExecutionResult::completed(exit_code, output, error).with_duration(duration_ms)
            }
            Ok(Err(e)) => ExecutionResult::failure(format!("Execution error: {}", e))
                .with_duration(duration_ms),
            Err(_) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                let limit_secs = ceiling.map(|d| d.as_secs()).unwrap_or(0);
                warn!(script = %entry.name, limit_secs, "Script timed out, killed");
                ExecutionResult {
                    success: false,
                    output,
                    error: format!("Script execution timed out after {} seconds", limit_secs),
                    exit_code: -1,
                    duration_ms,
                }
            }
        }
    }
}

/// Drain both pipes while waiting for exit. Run concurrently so a chatty
/// script cannot deadlock on a full pipe buffer.
async fn collect_and_wait(
    child: &mut Child,
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
    output: &mut String,
    error: &mut String,
) -> std::io::Result<std::process::ExitStatus> {
    let (status, (), ()) = tokio::join!(
        child.wait(),
        capture_lines(stdout, output),
        capture_lines(stderr, error),
    );
    status
}

async fn capture_lines<R>(stream: Option<R>, buffer: &mut String)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        buffer.push_str(&line);
        buffer.push('\n');
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
