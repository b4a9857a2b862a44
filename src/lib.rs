pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod group;
pub mod store;
pub mod sudo;

pub use catalog::{ScriptCatalogEntry, ScriptDiscoverer, ScriptGroup};
pub use classify::{ClassificationSummary, ElevationCategory, PrivilegeClassifier};
pub use config::AutoshellConfig;
pub use error::{AutoshellError, Result};
pub use exec::{ExecutionResult, ProcessRunner, TerminalLauncher};
pub use group::{GroupObserver, GroupOrchestrator, GroupSummary};
pub use store::CatalogStore;
pub use sudo::{CredentialBroker, SecretPrompt};
