use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use autoshell::catalog::{ScriptCatalogEntry, ScriptDiscoverer};
use autoshell::classify::PrivilegeClassifier;
use autoshell::cli::{Cli, Commands, ConfigAction, Display, GroupAction, PasswordPrompt, confirm};
use autoshell::config::{AutoshellConfig, default_config_dir};
use autoshell::error::{AutoshellError, Result};
use autoshell::exec::{ExecutionResult, ProcessRunner, TerminalLauncher};
use autoshell::group::{GroupObserver, GroupOrchestrator, GroupSummary};
use autoshell::store::CatalogStore;
use autoshell::sudo::CredentialBroker;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("autoshell=debug")
    } else {
        EnvFilter::new("autoshell=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };

    match cli.command {
        Commands::Scan { directory } => cmd_scan(&display, &config_dir, &directory).await,
        Commands::List {
            filter,
            tag,
            elevated,
        } => cmd_list(&display, &config_dir, filter, tag, elevated).await,
        Commands::Show { script } => cmd_show(&display, &config_dir, &script).await,
        Commands::Run {
            script,
            elevated,
            terminal,
        } => cmd_run(&display, &config_dir, &script, elevated, terminal).await,
        Commands::ChmodX { script } => cmd_chmod_x(&display, &config_dir, &script).await,
        Commands::Analyze { script } => cmd_analyze(&display, &config_dir, &script).await,
        Commands::Group { action } => cmd_group(&display, &config_dir, action).await,
        Commands::Config { action } => cmd_config(&display, &config_dir, action).await,
    }
}

async fn load_environment(config_dir: &Path) -> Result<(AutoshellConfig, CatalogStore)> {
    let config = AutoshellConfig::load(config_dir).await?;
    let store = CatalogStore::open(config.storage.resolved_db_path()?)?;
    Ok((config, store))
}

/// Resolve a script argument: exact catalog name first, then catalog path,
/// then a file on disk.
fn resolve_script(
    store: &CatalogStore,
    config: &AutoshellConfig,
    query: &str,
) -> Result<ScriptCatalogEntry> {
    if let Some(entry) = store.find_script(query)? {
        return Ok(entry);
    }

    let path = PathBuf::from(query);
    if path.is_file() {
        return ScriptDiscoverer::new(&config.discovery).inspect(&path);
    }

    Err(AutoshellError::NotInCatalog(query.to_string()))
}

async fn cmd_scan(display: &Display, config_dir: &Path, directory: &Path) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;

    let spinner = display.create_spinner(&format!("Scanning {}...", directory.display()));
    let discoverer = ScriptDiscoverer::new(&config.discovery);
    let result = discoverer.discover(directory);
    spinner.finish_and_clear();

    let mut entries = result?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let saved = store.save_all(&entries)?;

    let classifier = PrivilegeClassifier::new();
    let summary = classifier.classify_all(&entries);

    display.print_success(&format!(
        "Cataloged {} scripts from {}",
        saved,
        directory.display()
    ));
    display.print_scripts_table(&entries, &summary);

    Ok(())
}

async fn cmd_list(
    display: &Display,
    config_dir: &Path,
    filter: Option<String>,
    tag: Option<String>,
    elevated: bool,
) -> Result<()> {
    let (_config, store) = load_environment(config_dir).await?;

    let mut entries = store.all_scripts()?;
    if let Some(filter) = &filter {
        entries.retain(|e| e.matches_filter(filter));
    }
    if let Some(tag) = &tag {
        entries.retain(|e| e.has_tag(tag));
    }

    let classifier = PrivilegeClassifier::new();
    if elevated {
        entries.retain(|e| classifier.requires_elevation(e));
    }
    let summary = classifier.classify_all(&entries);

    display.print_header("Script Catalog");
    display.print_scripts_table(&entries, &summary);

    Ok(())
}

async fn cmd_show(display: &Display, config_dir: &Path, script: &str) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;
    let entry = resolve_script(&store, &config, script)?;

    let classifier = PrivilegeClassifier::new();
    let categories = classifier.matched_categories(&entry);
    display.print_script_detail(&entry, &categories);

    Ok(())
}

async fn cmd_run(
    display: &Display,
    config_dir: &Path,
    script: &str,
    elevated: bool,
    terminal: bool,
) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;
    let entry = resolve_script(&store, &config, script)?;
    let classifier = PrivilegeClassifier::new();

    if terminal {
        // Credential is optional here: without one, sudo prompts inside
        // the opened window instead.
        let secret = if classifier.requires_elevation(&entry) {
            let broker = CredentialBroker::new(&config.prompt);
            let prompt = PasswordPrompt::new();
            let reason = format!("Open terminal for: {}", entry.name);
            if broker.ensure_credential(&reason, &prompt).await {
                broker.secret_if_validated()
            } else {
                None
            }
        } else {
            None
        };

        let launcher = TerminalLauncher::new(&config.execution);
        launcher.launch(&entry, secret.as_deref()).await?;
        display.print_success(&format!("Terminal opened for: {}", entry.name));
        return Ok(());
    }

    let runner = ProcessRunner::new(&config.execution);
    display.print_info(&format!("Executing: {}", entry.name));

    let result = if elevated {
        let broker = CredentialBroker::new(&config.prompt);
        let prompt = PasswordPrompt::new();
        runner.run_elevated(&entry, &broker, &prompt).await
    } else {
        let spinner = display.create_spinner("Running script...");
        let result = runner.run(&entry).await;
        spinner.finish_and_clear();
        result
    };

    display.print_execution_result(&result);
    Ok(())
}

async fn cmd_chmod_x(display: &Display, config_dir: &Path, script: &str) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;
    let mut entry = resolve_script(&store, &config, script)?;

    let runner = ProcessRunner::new(&config.execution);
    if !runner.make_executable(&mut entry) {
        return Err(AutoshellError::PermissionDenied(format!(
            "could not mark {} executable",
            entry.file_path.display()
        )));
    }
    store.save_script(&entry)?;
    display.print_success(&format!("Marked executable: {}", entry.file_path.display()));

    Ok(())
}

async fn cmd_analyze(display: &Display, config_dir: &Path, script: &str) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;
    let entry = resolve_script(&store, &config, script)?;

    let classifier = PrivilegeClassifier::new();
    let categories = classifier.matched_categories(&entry);

    display.print_header(&format!("Analysis: {}", entry.name));
    if categories.is_empty() {
        display.print_success("No elevated commands detected.");
    } else {
        display.print_warning(&format!(
            "Sudo required ({} pattern categories matched):",
            categories.len()
        ));
        for category in &categories {
            display.print_info(category.as_str());
        }
    }

    Ok(())
}

async fn cmd_group(display: &Display, config_dir: &Path, action: GroupAction) -> Result<()> {
    let (config, store) = load_environment(config_dir).await?;

    match action {
        GroupAction::Create { name, description } => {
            let group = store.create_group(&name, &description)?;
            display.print_success(&format!("Created group: {}", group.name));
        }

        GroupAction::Add { group, script } => {
            let found = store
                .find_group(&group)?
                .ok_or_else(|| AutoshellError::GroupNotFound(group.clone()))?;
            let entry = resolve_script(&store, &config, &script)?;
            store.save_script(&entry)?;
            store.add_script_to_group(found.id, &entry.file_path)?;
            display.print_success(&format!("Added {} to group {}", entry.name, found.name));
        }

        GroupAction::List => {
            let groups = store.all_groups()?;
            display.print_header("Script Groups");
            display.print_groups_table(&groups);
        }

        GroupAction::Show { group } => {
            let found = store
                .find_group(&group)?
                .ok_or_else(|| AutoshellError::GroupNotFound(group.clone()))?;
            display.print_group_detail(&found);
        }

        GroupAction::Run { group, terminal } => {
            let found = store
                .find_group(&group)?
                .ok_or_else(|| AutoshellError::GroupNotFound(group.clone()))?;
            if found.is_empty() {
                display.print_warning("Group has no scripts.");
                return Ok(());
            }

            display.print_header(&format!("Running group: {}", found.name));
            let orchestrator = GroupOrchestrator::new(&config.execution);
            let observer = CliGroupObserver {
                display: Display::new(),
            };

            if terminal {
                let classifier = PrivilegeClassifier::new();
                let needs_sudo = found
                    .scripts
                    .iter()
                    .any(|e| classifier.requires_elevation(e));
                let secret = if needs_sudo {
                    let broker = CredentialBroker::new(&config.prompt);
                    let prompt = PasswordPrompt::new();
                    let reason = format!("Open terminals for group: {}", found.name);
                    if broker.ensure_credential(&reason, &prompt).await {
                        broker.secret_if_validated()
                    } else {
                        None
                    }
                } else {
                    None
                };
                orchestrator
                    .run_sequential_in_terminals(&found, secret.as_deref(), &observer)
                    .await;
            } else {
                orchestrator.run_sequential(&found, &observer).await;
            }
        }

        GroupAction::Remove { group, script } => {
            let found = store
                .find_group(&group)?
                .ok_or_else(|| AutoshellError::GroupNotFound(group.clone()))?;

            match script {
                Some(script) => {
                    let entry = resolve_script(&store, &config, &script)?;
                    store.remove_script_from_group(found.id, &entry.file_path)?;
                    display.print_success(&format!(
                        "Removed {} from group {}",
                        entry.name, found.name
                    ));
                }
                None => {
                    if !confirm(&format!("Remove group '{}'?", found.name)) {
                        display.print_info("Cancelled.");
                        return Ok(());
                    }
                    store.remove_group(found.id)?;
                    display.print_success(&format!("Removed group: {}", found.name));
                }
            }
        }
    }

    Ok(())
}

async fn cmd_config(display: &Display, config_dir: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AutoshellConfig::load(config_dir).await?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", config_dir.join("config.toml").display());
        }
        ConfigAction::Reset => {
            let config = AutoshellConfig::default();
            config.save(config_dir).await?;
            display.print_success("Configuration reset to defaults.");
        }
    }

    Ok(())
}

/// Streams group progress to the terminal as each script runs.
struct CliGroupObserver {
    display: Display,
}

impl GroupObserver for CliGroupObserver {
    fn on_progress(&self, index: usize, total: usize, name: &str) {
        self.display
            .print_info(&format!("[{}/{}] {}", index + 1, total, name));
    }

    fn on_item_done(&self, entry: &ScriptCatalogEntry, result: &ExecutionResult) {
        if result.success {
            self.display.print_success(&format!(
                "{} (exit code {}, {} ms)",
                entry.name, result.exit_code, result.duration_ms
            ));
        } else {
            let reason = result.error.lines().next().unwrap_or("failed");
            self.display
                .print_error(&format!("{}: {}", entry.name, reason));
        }
    }

    fn on_group_done(&self, summary: &GroupSummary) {
        self.display.print_group_summary(summary);
    }
}
