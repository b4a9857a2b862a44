//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: formatted terminal output with colors and status symbols
//! - `PasswordPrompt`: masked credential entry for elevated runs

mod commands;
mod display;
mod interactive;

pub use commands::{Cli, Commands, ConfigAction, GroupAction};
pub use display::Display;
pub use interactive::{PasswordPrompt, confirm};
