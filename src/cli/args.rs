//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `scan`: Index key usages and list them
//! - `suggest`: Propose namespaces for flat keys
//! - `apply`: Migrate suggested keys in sources and catalogs
//! - `init`: Create a `.nestkeyrc.json` configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Scan(cmd)) => cmd.common.verbose,
            Some(Command::Suggest(cmd)) => cmd.common.verbose,
            Some(Command::Apply(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, env = "NESTKEY_PROJECT")]
    pub path: Option<PathBuf>,

    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<String>,

    /// Messages directory path (overrides config file)
    #[arg(long)]
    pub messages_root: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ScanCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    /// Minimum confidence (0.6 to 1.0, overrides config file)
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SuggestCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub suggest: SuggestArgs,
}

#[derive(Debug, Args)]
pub struct ApplyCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub suggest: SuggestArgs,

    /// Actually rewrite files (default is dry-run)
    #[arg(long)]
    pub apply: bool,

    /// Only migrate these keys (default: every suggestion)
    /// Can be specified multiple times: --key welcome --key cta
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index message key usages in source files
    Scan(ScanCommand),
    /// Suggest route namespaces for flat message keys
    Suggest(SuggestCommand),
    /// Move suggested keys into their namespaces (dry-run unless --apply)
    Apply(ApplyCommand),
    /// Initialize a new .nestkeyrc.json configuration file
    Init,
}
