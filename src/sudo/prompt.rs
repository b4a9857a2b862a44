/// Capability for obtaining an elevation secret from the user.
///
/// Implementations own any terminal or thread handling; the broker calls
/// them synchronously from whatever task needs the credential.
pub trait SecretPrompt: Send + Sync {
    /// Ask for the secret. `None` means the user cancelled.
    fn request_secret(&self, reason: &str) -> Option<String>;

    /// Surface a rejected or empty entry before the next attempt.
    fn notify_invalid(&self, message: &str) {
        let _ = message;
    }
}
