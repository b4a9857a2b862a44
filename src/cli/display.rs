use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{ScriptCatalogEntry, ScriptGroup};
use crate::classify::{ClassificationSummary, ElevationCategory, PrivilegeClassifier};
use crate::exec::ExecutionResult;
use crate::group::GroupSummary;

/// Lines of script content shown by `print_script_detail`.
const CONTENT_PREVIEW_LINES: usize = 10;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_scripts_table(
        &self,
        entries: &[ScriptCatalogEntry],
        summary: &ClassificationSummary,
    ) {
        if entries.is_empty() {
            println!("{}", style("No scripts found.").dim());
            return;
        }

        println!(
            "Total: {}  Sudo required: {}  Non-sudo: {}",
            summary.total,
            style(summary.elevated).red(),
            style(summary.plain).green()
        );
        println!();

        println!(
            "{:<24} {:<42} {:<6} {:<6}",
            style("Name").bold(),
            style("Description").bold(),
            style("Sudo").bold(),
            style("Exec").bold()
        );
        println!("{}", style("─".repeat(80)).dim());

        let classifier = PrivilegeClassifier::new();
        for entry in entries {
            let sudo = if classifier.requires_elevation(entry) {
                style("yes").red().bold().to_string()
            } else {
                style("-").dim().to_string()
            };
            let exec = if entry.executable {
                style("yes").green().to_string()
            } else {
                style("no").yellow().to_string()
            };

            println!(
                "{:<24} {:<42} {:<6} {:<6}",
                truncate(&entry.name, 22),
                truncate(&entry.description, 40),
                sudo,
                exec
            );
        }
    }

    pub fn print_script_detail(
        &self,
        entry: &ScriptCatalogEntry,
        categories: &[ElevationCategory],
    ) {
        self.print_header(&format!("Script: {}", entry.name));

        println!("Description: {}", style(&entry.description).white().bold());
        println!("Path:        {}", entry.file_path.display());

        let modified = entry
            .last_modified
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("Modified:    {}", modified);

        let exec = if entry.executable {
            style("yes").green()
        } else {
            style("no").yellow()
        };
        println!("Executable:  {}", exec);

        let tags = if entry.tags.is_empty() {
            "-".to_string()
        } else {
            entry.tags.join(", ")
        };
        println!("Tags:        {}", tags);

        if categories.is_empty() {
            println!("Privileges:  {}", style("none").green());
        } else {
            println!("Privileges:  {}", style("sudo required").red().bold());
            println!();
            println!("{}", style("Matched patterns:").bold());
            for category in categories {
                println!("  {} {}", style("→").cyan(), category.as_str());
            }
        }

        if !entry.content.is_empty() {
            println!();
            println!("{}", style("Content:").bold());
            let lines: Vec<&str> = entry.content.lines().collect();
            for line in lines.iter().take(CONTENT_PREVIEW_LINES) {
                println!("  {}", style(line).dim());
            }
            if lines.len() > CONTENT_PREVIEW_LINES {
                println!(
                    "  {}",
                    style(format!("... {} more lines", lines.len() - CONTENT_PREVIEW_LINES)).dim()
                );
            }
        }
        println!();
    }

    pub fn print_groups_table(&self, groups: &[ScriptGroup]) {
        if groups.is_empty() {
            println!("{}", style("No groups found.").dim());
            return;
        }

        println!(
            "{:<20} {:<34} {:<8} {:<16}",
            style("Name").bold(),
            style("Description").bold(),
            style("Scripts").bold(),
            style("Created").bold()
        );
        println!("{}", style("─".repeat(80)).dim());

        for group in groups {
            println!(
                "{:<20} {:<34} {:<8} {:<16}",
                truncate(&group.name, 18),
                truncate(&group.description, 32),
                group.len(),
                group.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    pub fn print_group_detail(&self, group: &ScriptGroup) {
        self.print_header(&format!("Group: {}", group.name));

        if !group.description.is_empty() {
            println!("Description: {}", style(&group.description).white().bold());
        }
        println!(
            "Created:     {}",
            group.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!("Scripts:     {}", group.len());
        println!();

        if group.is_empty() {
            println!("{}", style("No scripts in this group.").dim());
            return;
        }

        let classifier = PrivilegeClassifier::new();
        for (index, entry) in group.scripts.iter().enumerate() {
            let sudo = if classifier.requires_elevation(entry) {
                style(" [sudo]").red().to_string()
            } else {
                String::new()
            };
            println!(
                "  {}. {}{}  {}",
                index + 1,
                style(&entry.name).bold(),
                sudo,
                style(entry.file_path.display()).dim()
            );
        }
    }

    pub fn print_execution_result(&self, result: &ExecutionResult) {
        if result.success {
            self.print_success(&format!(
                "Completed with exit code {} in {} ms",
                result.exit_code, result.duration_ms
            ));
        } else {
            self.print_error(&format!(
                "Failed with exit code {} in {} ms",
                result.exit_code, result.duration_ms
            ));
        }

        if !result.output.is_empty() {
            println!();
            println!("{}", style("Output:").bold());
            print!("{}", result.output);
        }
        if !result.error.is_empty() {
            println!();
            println!("{}", style("Errors:").bold().red());
            println!("{}", result.error.trim_end());
        }
    }

    pub fn print_group_summary(&self, summary: &GroupSummary) {
        println!();
        if summary.failed == 0 {
            self.print_success(&summary.message);
        } else {
            self.print_error(&summary.message);
        }
        println!(
            "Succeeded: {}  Failed: {}  Total: {}  ({} ms)",
            style(summary.succeeded).green(),
            style(summary.failed).red(),
            summary.total,
            summary.duration_ms
        );
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
