use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::entry::{CONTENT_UNAVAILABLE, NO_DESCRIPTION, ScriptCatalogEntry};
use crate::config::DiscoveryConfig;
use crate::error::{AutoshellError, Result};

/// Walks a directory tree and builds catalog entries for every script file.
///
/// Unreadable files degrade to an entry with empty content rather than
/// failing the scan. Result order is walk order; callers wanting stable
/// output sort by name or path.
pub struct ScriptDiscoverer {
    extension: String,
    follow_symlinks: bool,
    max_depth: usize,
}

impl ScriptDiscoverer {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            extension: format!(".{}", config.extension.to_lowercase()),
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
        }
    }

    pub fn discover(&self, root: &Path) -> Result<Vec<ScriptCatalogEntry>> {
        if !root.is_dir() {
            return Err(AutoshellError::InvalidInput(root.to_path_buf()));
        }

        let mut walker = WalkDir::new(root).follow_links(self.follow_symlinks);
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        let mut entries = Vec::new();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !self.is_script_file(path) {
                continue;
            }
            entries.push(self.build_entry(path));
        }

        debug!(
            root = %root.display(),
            count = entries.len(),
            "Discovery complete"
        );

        Ok(entries)
    }

    /// Build a catalog entry for one explicit file, bypassing the extension
    /// filter. Used when a caller names a script by path.
    pub fn inspect(&self, path: &Path) -> Result<ScriptCatalogEntry> {
        if !path.is_file() {
            return Err(AutoshellError::NotFound(path.to_path_buf()));
        }
        Ok(self.build_entry(path))
    }

    fn is_script_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().to_lowercase().ends_with(&self.extension))
            .unwrap_or(false)
    }

    fn build_entry(&self, path: &Path) -> ScriptCatalogEntry {
        let mut entry = ScriptCatalogEntry::new(path);
        entry.executable = is_executable(path);
        entry.last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        match std::fs::read_to_string(path) {
            Ok(content) => {
                entry.description = extract_description(&content);
                for tag in extract_tags(&content) {
                    entry.add_tag(tag);
                }
                entry.content = content;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read script");
                entry.content = String::new();
                entry.description = String::from(CONTENT_UNAVAILABLE);
            }
        }

        entry
    }
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(_path: &Path) -> bool {
    true
}

/// First comment line that is not a shebang and has more than three
/// characters after the marker. One leading `#` is stripped; a second one
/// survives into the description.
fn extract_description(content: &str) -> String {
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') && !line.starts_with("#!/") {
            let description = line[1..].trim();
            if !description.is_empty() && description.chars().count() > 3 {
                return description.to_string();
            }
        }
    }
    String::from(NO_DESCRIPTION)
}

/// Collects tags from comment lines of the form `# Tag: a, b, c`.
///
/// The line must start with `tag` (case-insensitive) after the marker; the
/// list is the segment between the first and second colon, split on commas.
/// Empty pieces are dropped here, duplicates by the caller's `add_tag`.
fn extract_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with('#') || !line.to_lowercase().contains("tag") {
            continue;
        }
        let tag_line = line[1..].trim();
        if !tag_line.to_lowercase().starts_with("tag") {
            continue;
        }
        if let Some(list) = tag_line.split(':').nth(1) {
            for tag in list.split(',') {
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.push(tag.to_string());
                }
            }
        }
    }
    tags
}
