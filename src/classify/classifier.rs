use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{ElevationCategory, elevation_patterns, suppression_patterns};
use crate::catalog::ScriptCatalogEntry;

/// Aggregate classification over a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub total: usize,
    pub elevated: usize,
    pub plain: usize,
}

impl ClassificationSummary {
    pub fn has_elevated(&self) -> bool {
        self.elevated > 0
    }
}

impl fmt::Display for ClassificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Sudo required: {}, Non-sudo: {}",
            self.total, self.elevated, self.plain
        )
    }
}

/// Decides whether a script needs elevated execution.
///
/// Never fails: unreadable or empty content classifies as not elevated so a
/// broken file cannot block the rest of a catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeClassifier;

impl PrivilegeClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn requires_elevation(&self, entry: &ScriptCatalogEntry) -> bool {
        match script_content(entry) {
            Some(content) if !content.trim().is_empty() => {
                let elevated = matches_elevation(&content);
                debug!(script = %entry.name, elevated, "Classified script");
                elevated
            }
            _ => false,
        }
    }

    /// Categories matched by a script's content, in table order. Used by
    /// detail views; classification itself only needs the first hit.
    pub fn matched_categories(&self, entry: &ScriptCatalogEntry) -> Vec<ElevationCategory> {
        let Some(content) = script_content(entry) else {
            return Vec::new();
        };
        let mut categories = Vec::new();
        for (re, category) in elevation_patterns() {
            if re.is_match(&content) && !categories.contains(category) {
                categories.push(*category);
            }
        }
        categories
    }

    pub fn classify_all(&self, entries: &[ScriptCatalogEntry]) -> ClassificationSummary {
        let elevated = entries
            .iter()
            .filter(|e| self.requires_elevation(e))
            .count();
        ClassificationSummary {
            total: entries.len(),
            elevated,
            plain: entries.len() - elevated,
        }
    }
}

/// Cached content when present, else a fresh read of the backing file.
/// Any failure yields `None`.
fn script_content(entry: &ScriptCatalogEntry) -> Option<String> {
    if !entry.content.trim().is_empty() {
        return Some(entry.content.clone());
    }
    if entry.file_path.exists() {
        return std::fs::read_to_string(&entry.file_path).ok();
    }
    None
}

/// Applies both tables. Suppression matches are logged only; the outcome is
/// driven by the elevation table alone.
fn matches_elevation(content: &str) -> bool {
    for (re, category) in suppression_patterns() {
        if re.is_match(content) {
            debug!(category = category.as_str(), "Suppression pattern matched");
        }
    }

    for (re, category) in elevation_patterns() {
        if re.is_match(content) {
            debug!(category = category.as_str(), "Elevation pattern matched");
            return true;
        }
    }

    false
}
