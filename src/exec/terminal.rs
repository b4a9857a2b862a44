use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::catalog::ScriptCatalogEntry;
use crate::config::ExecutionConfig;
use crate::error::{AutoshellError, Result};

/// How long a launched terminal gets to read the wrapper before cleanup.
const WRAPPER_GRACE: Duration = Duration::from_secs(2);

/// Opens a script in an external terminal emulator.
///
/// The script is wrapped in a small runner that prints a banner, executes
/// the script (through `sudo -S` with the piped credential when one is
/// given), reports the outcome, and waits for a keypress so the window
/// does not vanish. Candidate emulators are tried in configured order;
/// the first one that starts wins.
pub struct TerminalLauncher {
    terminals: Vec<String>,
}

impl TerminalLauncher {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            terminals: config.terminals.clone(),
        }
    }

    /// Launch `entry` in a terminal window. Returns once a terminal has
    /// started (or every candidate has failed); the script itself runs
    /// unsupervised in the window.
    pub async fn launch(&self, entry: &ScriptCatalogEntry, secret: Option<&str>) -> Result<()> {
        let wrapper = write_wrapper(entry, secret).await?;

        for program in &self.terminals {
            let mut command = Command::new(program);
            command
                .arg(launcher_flag(program))
                .arg(&wrapper)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());

            match command.spawn() {
                Ok(_child) => {
                    debug!(terminal = %program, script = %entry.name, "Terminal opened");
                    // Give the emulator time to read the wrapper, then clean up.
                    tokio::time::sleep(WRAPPER_GRACE).await;
                    if let Err(e) = tokio::fs::remove_file(&wrapper).await {
                        warn!(path = %wrapper.display(), error = %e, "Could not remove wrapper script");
                    }
                    return Ok(());
                }
                Err(e) => {
                    debug!(terminal = %program, error = %e, "Terminal not available");
                }
            }
        }

        let _ = tokio::fs::remove_file(&wrapper).await;
        Err(AutoshellError::NoTerminalFound(self.terminals.join(", ")))
    }
}

/// `gnome-terminal` separates its own options from the command with `--`;
/// the others take `-e`.
fn launcher_flag(program: &str) -> &'static str {
    if program.ends_with("gnome-terminal") {
        "--"
    } else {
        "-e"
    }
}

async fn write_wrapper(entry: &ScriptCatalogEntry, secret: Option<&str>) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!(
        "autoshell_run_{}.sh",
        Utc::now().timestamp_millis()
    ));
    tokio::fs::write(&path, wrapper_content(entry, secret)).await?;
    restrict_to_owner(&path)?;
    Ok(path)
}

/// Wrapper is owner-only: with a piped credential it briefly holds
/// the secret in plain text.
#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o700);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

fn wrapper_content(entry: &ScriptCatalogEntry, secret: Option<&str>) -> String {
    let script = shell_quote(&entry.file_path.display().to_string());
    let (banner, run_line) = match secret {
        Some(secret) => (
            format!("🔐 Running with administrator privileges: {}", entry.name),
            format!("echo {} | sudo -S bash {}", shell_quote(secret), script),
        ),
        None => (
            format!("Running: {}", entry.name),
            format!("bash {}", script),
        ),
    };

    format!(
        "#!/bin/bash\n\
         echo {banner}\n\
         echo ''\n\
         if {run_line}; then\n\
         \x20   echo ''\n\
         \x20   echo '✅ Script completed successfully!'\n\
         else\n\
         \x20   echo ''\n\
         \x20   echo '❌ Script execution failed!'\n\
         fi\n\
         echo ''\n\
         echo 'Press any key to close this terminal...'\n\
         read -n 1\n",
        banner = shell_quote(&banner),
        run_line = run_line,
    )
}

/// Single-quote for POSIX shells; embedded quotes become `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
