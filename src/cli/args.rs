//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Poll a source tree, compile changes, republish outputs atomically
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: reload.toml)
    #[arg(short = 'C', long, global = true, default_value = "reload.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the configured roots until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Poll interval in milliseconds (overrides [watch].interval_ms)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Directories to watch (overrides [watch].roots)
        #[arg(value_name = "ROOT", value_hint = clap::ValueHint::DirPath)]
        roots: Vec<PathBuf>,
    },

    /// Compile everything once, print diagnostics, exit non-zero on errors
    #[command(visible_alias = "c")]
    Check,
}
