use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{AutoshellError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoshellConfig {
    pub discovery: DiscoveryConfig,
    pub execution: ExecutionConfig,
    pub prompt: PromptConfig,
    pub storage: StorageConfig,
}

impl AutoshellConfig {
    pub async fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, config_dir: &Path) -> Result<()> {
        self.validate()?;
        fs::create_dir_all(config_dir).await?;
        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.discovery.extension.is_empty() {
            errors.push("discovery.extension must not be empty");
        }
        if self.discovery.extension.starts_with('.') {
            errors.push("discovery.extension must not include a leading dot");
        }

        if self.execution.timeout_secs == 0 {
            errors.push("execution.timeout_secs must be greater than 0");
        }
        if self.execution.terminals.is_empty() {
            errors.push("execution.terminals must not be empty");
        }

        if self.prompt.validation_timeout_secs == 0 {
            errors.push("prompt.validation_timeout_secs must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AutoshellError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Default configuration directory (`~/.config/autoshell` on Linux).
pub fn default_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| AutoshellError::Config("Could not find config directory".to_string()))?;
    Ok(base.join("autoshell"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Recognized script extension, without the dot. Matched case-insensitively.
    pub extension: String,
    pub follow_symlinks: bool,
    /// Maximum walk depth below the root (0 = unlimited).
    pub max_depth: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: String::from("sh"),
            follow_symlinks: false,
            max_depth: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Ceiling for a plain (non-elevated) run in seconds.
    pub timeout_secs: u64,
    /// Ceiling for an elevated run in seconds (0 = unlimited).
    pub elevated_timeout_secs: u64,
    /// Pause between terminal launches during group runs.
    pub terminal_delay_ms: u64,
    /// Terminal emulators to try, in order. First one that starts wins.
    pub terminals: Vec<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            elevated_timeout_secs: 0,
            terminal_delay_ms: 500,
            terminals: vec![
                String::from("gnome-terminal"),
                String::from("konsole"),
                String::from("xfce4-terminal"),
                String::from("xterm"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Bounded wait for the sudo validation probe in seconds.
    pub validation_timeout_secs: u64,
    /// Password attempts before giving up (0 = re-prompt until cancelled).
    pub max_attempts: u32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            validation_timeout_secs: 30,
            max_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Catalog database path. Empty = `<data dir>/autoshell/autoshell.db`.
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        if !self.db_path.is_empty() {
            return Ok(PathBuf::from(&self.db_path));
        }
        let base = dirs::data_dir()
            .ok_or_else(|| AutoshellError::Config("Could not find data directory".to_string()))?;
        Ok(base.join("autoshell").join("autoshell.db"))
    }
}
