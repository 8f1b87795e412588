//! reloadkit - watch, compile, and republish resources.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use reloadkit::config::ReloadConfig;
use reloadkit::logger;
use reloadkit::utils::path::normalize_path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let mut config = ReloadConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Watch { interval, roots } => {
            if !roots.is_empty() {
                // Command-line roots are relative to the working directory.
                let roots: Vec<_> = roots.iter().map(|r| normalize_path(r)).collect();
                config.set_roots(&roots);
            }
            if let Some(ms) = interval {
                config.watch.interval_ms = *ms;
            }
            config.validate()?;
            cli::watch::run(&config)
        }
        Commands::Check => {
            if !cli::check::run(&config)? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
