use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoshellError {
    #[error("Not a directory: {}", .0.display())]
    InvalidInput(PathBuf),

    #[error("Script file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{operation} timed out after {duration_secs}s")]
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    #[error("Failed to start {program}: {message}")]
    SpawnFailure { program: String, message: String },

    #[error("No terminal emulator found (tried: {0})")]
    NoTerminalFound(String),

    #[error("Storage error ({operation}): {message}")]
    Storage { operation: String, message: String },

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group already exists: {0}")]
    GroupAlreadyExists(String),

    #[error("Script not in catalog: {0}")]
    NotInCatalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl AutoshellError {
    /// Storage failures carry the operation that hit them so the message
    /// points at the right call site without a backtrace.
    pub fn storage(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AutoshellError>;
