use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autoshell")]
#[command(author, version, about = "Discover, classify, and run shell scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration directory (default: ~/.config/autoshell)
    #[arg(long, global = true, env = "AUTOSHELL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory for shell scripts and add them to the catalog
    Scan {
        /// Directory to scan
        directory: PathBuf,
    },

    /// List cataloged scripts
    List {
        /// Case-insensitive name/description filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Only scripts carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only scripts that need elevated privileges
        #[arg(long)]
        elevated: bool,
    },

    /// Show one script in detail
    Show {
        /// Script name or path
        script: String,
    },

    /// Run a script
    Run {
        /// Script name or path
        script: String,

        /// Acquire sudo credentials if the script needs them
        #[arg(short, long)]
        elevated: bool,

        /// Open the script in a terminal window instead of capturing output
        #[arg(short, long)]
        terminal: bool,
    },

    /// Set the executable bit on a script
    ChmodX {
        /// Script name or path
        script: String,
    },

    /// Explain a script's privilege classification
    Analyze {
        /// Script name or path
        script: String,
    },

    /// Manage script groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a new group
    Create {
        name: String,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Add a cataloged script to a group
    Add {
        group: String,

        /// Script name or path
        script: String,
    },

    /// List all groups
    List,

    /// Show a group and its members
    Show { group: String },

    /// Run a group's scripts in order, stopping at the first failure
    Run {
        group: String,

        /// Open each script in its own terminal window
        #[arg(short, long)]
        terminal: bool,
    },

    /// Remove a script from a group, or the whole group
    Remove {
        group: String,

        /// Script to remove; when omitted the group itself is removed
        script: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Reset to defaults
    Reset,
}
