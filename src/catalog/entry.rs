use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description used when a script has no usable comment line.
pub const NO_DESCRIPTION: &str = "No description available";

/// Description used when the backing file could not be read.
pub const CONTENT_UNAVAILABLE: &str = "Unable to read file content";

/// One discovered script file and its derived metadata.
///
/// Identity is the absolute file path. Content is cached at discovery time
/// so classification never re-reads the file on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCatalogEntry {
    pub name: String,
    pub description: String,
    pub file_path: PathBuf,
    pub last_modified: Option<DateTime<Utc>>,
    pub executable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: String,
}

impl ScriptCatalogEntry {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            description: String::from(NO_DESCRIPTION),
            file_path,
            last_modified: None,
            executable: false,
            tags: Vec::new(),
            content: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }

    /// Adds a tag, dropping empty strings and duplicates.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive substring match on name or description, for catalog
    /// filtering.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// A named, ordered collection of catalog entries executed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptGroup {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scripts: Vec<ScriptCatalogEntry>,
}

impl ScriptGroup {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            scripts: Vec::new(),
        }
    }

    /// Adds a member unless one with the same path is already present.
    pub fn add_script(&mut self, script: ScriptCatalogEntry) {
        if !self.contains(&script.file_path) {
            self.scripts.push(script);
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.scripts.iter().any(|s| s.file_path == path)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
