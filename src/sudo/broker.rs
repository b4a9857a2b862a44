use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::prompt::SecretPrompt;
use crate::config::PromptConfig;

#[derive(Debug, Default)]
struct CredentialState {
    secret: Option<String>,
    validated: bool,
}

/// Caches one validated elevation secret, shared across executions.
///
/// Clones share state. The secret is readable only while the validated
/// flag is set, and both clear together, so a reader can never observe a
/// half-updated credential.
#[derive(Clone)]
pub struct CredentialBroker {
    state: Arc<Mutex<CredentialState>>,
    probe_program: String,
    probe_args: Vec<String>,
    validation_timeout: Duration,
    max_attempts: u32,
}

impl CredentialBroker {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CredentialState::default())),
            probe_program: String::from("sudo"),
            // -k discards any sudo timestamp so the probe always checks the
            // candidate secret itself.
            probe_args: vec![String::from("-S"), String::from("-k"), String::from("true")],
            validation_timeout: Duration::from_secs(config.validation_timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Replace the validation probe. The program must read the secret from
    /// stdin and exit zero when it is accepted.
    pub fn with_probe(mut self, program: impl Into<String>, args: &[&str]) -> Self {
        self.probe_program = program.into();
        self.probe_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Ensures a validated secret is cached, prompting if needed.
    ///
    /// Returns true immediately when a validated secret is already held.
    /// Otherwise runs the prompt-validate loop until a candidate is
    /// accepted, the user cancels, or the attempt cap (if any) is reached.
    pub async fn ensure_credential(&self, reason: &str, prompt: &dyn SecretPrompt) -> bool {
        if self.has_validated_secret() {
            return true;
        }

        // Drop any stale rejected state before prompting.
        self.invalidate();

        let mut attempts = 0u32;
        loop {
            if self.max_attempts > 0 && attempts >= self.max_attempts {
                debug!(attempts, "Credential attempts exhausted");
                return false;
            }
            attempts += 1;

            let Some(candidate) = prompt.request_secret(reason) else {
                debug!("Credential prompt cancelled");
                return false;
            };
            let candidate = candidate.trim().to_string();
            if candidate.is_empty() {
                prompt.notify_invalid("Please enter a password.");
                continue;
            }

            if self.validate_secret(&candidate).await {
                let mut state = self.state.lock();
                state.secret = Some(candidate);
                state.validated = true;
                debug!("Credential validated and cached");
                return true;
            }

            prompt.notify_invalid("The password you entered is incorrect. Please try again.");
        }
    }

    pub fn secret_if_validated(&self) -> Option<String> {
        let state = self.state.lock();
        if state.validated {
            state.secret.clone()
        } else {
            None
        }
    }

    pub fn has_validated_secret(&self) -> bool {
        let state = self.state.lock();
        state.validated && state.secret.is_some()
    }

    /// Clears the cached secret and the validated flag together.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.secret = None;
        state.validated = false;
    }

    async fn validate_secret(&self, secret: &str) -> bool {
        let mut command = Command::new(&self.probe_program);
        command
            .args(&self.probe_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // Reaps the probe if the bounded wait abandons it.
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.probe_program, error = %e, "Could not start validation probe");
                return false;
            }
        };

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(format!("{}\n", secret).as_bytes()).await
        {
            warn!(error = %e, "Could not write to validation probe");
        }

        match timeout(self.validation_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => true,
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!(stderr = %stderr.trim(), "Validation probe rejected secret");
                false
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Validation probe failed");
                false
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.validation_timeout.as_secs(),
                    "Validation probe timed out"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Prompt that replays a fixed response sequence.
    struct ScriptedPrompt {
        responses: Mutex<VecDeque<Option<String>>>,
        prompt_count: AtomicUsize,
        invalid_messages: Mutex<Vec<String>>,
    }

    impl ScriptedPrompt {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(String::from))
                        .collect(),
                ),
                prompt_count: AtomicUsize::new(0),
                invalid_messages: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> usize {
            self.prompt_count.load(Ordering::SeqCst)
        }
    }

    impl SecretPrompt for ScriptedPrompt {
        fn request_secret(&self, _reason: &str) -> Option<String> {
            self.prompt_count.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().pop_front().flatten()
        }

        fn notify_invalid(&self, message: &str) {
            self.invalid_messages.lock().push(message.to_string());
        }
    }

    fn broker_with_probe(accept: bool) -> CredentialBroker {
        let script = if accept {
            "read _line; exit 0"
        } else {
            "read _line; exit 1"
        };
        CredentialBroker::new(&PromptConfig::default()).with_probe("sh", &["-c", script])
    }

    #[tokio::test]
    async fn test_validated_secret_is_cached_across_reasons() {
        let broker = broker_with_probe(true);
        let prompt = ScriptedPrompt::new(vec![Some("hunter2")]);

        assert!(broker.ensure_credential("first script", &prompt).await);
        assert_eq!(broker.secret_if_validated().as_deref(), Some("hunter2"));

        // Different reason, no new prompt.
        assert!(broker.ensure_credential("second script", &prompt).await);
        assert_eq!(prompt.prompts(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reprompt() {
        let broker = broker_with_probe(true);
        let prompt = ScriptedPrompt::new(vec![Some("hunter2"), Some("hunter2")]);

        assert!(broker.ensure_credential("script", &prompt).await);
        broker.invalidate();
        assert_eq!(broker.secret_if_validated(), None);

        assert!(broker.ensure_credential("script", &prompt).await);
        assert_eq!(prompt.prompts(), 2);
    }

    #[tokio::test]
    async fn test_cancel_returns_false_without_caching() {
        let broker = broker_with_probe(true);
        let prompt = ScriptedPrompt::new(vec![None]);

        assert!(!broker.ensure_credential("script", &prompt).await);
        assert_eq!(broker.secret_if_validated(), None);
        assert_eq!(prompt.prompts(), 1);
    }

    #[tokio::test]
    async fn test_rejected_secret_reprompts_then_cancel() {
        let broker = broker_with_probe(false);
        let prompt = ScriptedPrompt::new(vec![Some("wrong"), None]);

        assert!(!broker.ensure_credential("script", &prompt).await);
        assert_eq!(prompt.prompts(), 2);
        assert_eq!(
            prompt.invalid_messages.lock().as_slice(),
            ["The password you entered is incorrect. Please try again."]
        );
        assert!(!broker.has_validated_secret());
    }

    #[tokio::test]
    async fn test_empty_input_reprompts_without_probe() {
        let broker = broker_with_probe(true);
        let prompt = ScriptedPrompt::new(vec![Some("   "), Some("hunter2")]);

        assert!(broker.ensure_credential("script", &prompt).await);
        assert_eq!(prompt.prompts(), 2);
        assert_eq!(
            prompt.invalid_messages.lock().as_slice(),
            ["Please enter a password."]
        );
    }

    #[tokio::test]
    async fn test_attempt_cap_stops_loop() {
        let config = PromptConfig {
            validation_timeout_secs: 30,
            max_attempts: 2,
        };
        let broker =
            CredentialBroker::new(&config).with_probe("sh", &["-c", "read _line; exit 1"]);
        let prompt = ScriptedPrompt::new(vec![Some("a"), Some("b"), Some("c")]);

        assert!(!broker.ensure_credential("script", &prompt).await);
        assert_eq!(prompt.prompts(), 2);
    }

    #[tokio::test]
    async fn test_secret_is_trimmed_before_validation() {
        let broker = broker_with_probe(true);
        let prompt = ScriptedPrompt::new(vec![Some("  hunter2  ")]);

        assert!(broker.ensure_credential("script", &prompt).await);
        assert_eq!(broker.secret_if_validated().as_deref(), Some("hunter2"));
    }
}
