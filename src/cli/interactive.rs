//! Interactive prompts: masked credential entry and confirmations.

use console::style;
use dialoguer::{Confirm, Password};

use crate::sudo::SecretPrompt;

/// Masked password prompt on the controlling terminal.
///
/// Empty entries are passed through so the broker decides whether to ask
/// again; interrupted or terminal-less input maps to a cancel.
pub struct PasswordPrompt;

impl PasswordPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PasswordPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretPrompt for PasswordPrompt {
    fn request_secret(&self, reason: &str) -> Option<String> {
        println!();
        println!("{}", style(format!("🔐 {}", reason)).bold());
        Password::new()
            .with_prompt("Sudo password")
            .allow_empty_password(true)
            .interact()
            .ok()
    }

    fn notify_invalid(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }
}

/// Yes/no confirmation defaulting to no. Input failure counts as refusal.
pub fn confirm(question: &str) -> bool {
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .unwrap_or(false)
}
