//! Elevation credential handling.
//!
//! - `CredentialBroker`: caches one validated sudo secret for the process
//!   lifetime, prompting at most once while it stays valid
//! - `SecretPrompt`: masked-input capability supplied by the presentation
//!   layer

mod broker;
mod prompt;

pub use broker::CredentialBroker;
pub use prompt::SecretPrompt;
