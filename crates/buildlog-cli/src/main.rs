mod cli;
mod commands;
mod logging;
mod render;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Verbosity};
use colored::Colorize;

use buildlog_core::config::{ColorChoice, LoggerConfig};
use buildlog_core::error::ReplayError;

/// Exit code when the replayed build reported failure.
const EXIT_BUILD_FAILED: i32 = 1;
/// Exit code for a malformed event log.
const EXIT_BAD_INPUT: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();
    let _log_guard = logging::init(verbosity, cli.log_dir.as_deref());

    // `init` and `completion` don't need a loaded config
    if let Commands::Init(args) = cli.command {
        return match commands::init::run(args) {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("\n{} {}", "FAILED".red().bold(), e);
                std::process::exit(1);
            }
        };
    }

    if let Commands::Completion(args) = cli.command {
        clap_complete::generate(
            args.shell,
            &mut <Cli as clap::CommandFactory>::command(),
            "buildlog",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load config: {:#}", "ERROR".red().bold(), e);
            std::process::exit(1);
        }
    };

    if verbosity != Verbosity::Quiet {
        for warning in config.validate() {
            eprintln!("{} {}", "WARNING:".yellow().bold(), warning);
        }
    }

    let color = resolve_color(cli.color.map(Into::into).unwrap_or(config.color));
    colored::control::set_override(color);

    let result = match cli.command {
        Commands::Replay(args) => commands::replay::run(args, config, color).await,
        Commands::Init(_) => unreachable!("init handled above"),
        Commands::Completion(_) => unreachable!("completion handled above"),
    };

    match result {
        Ok(outcome) => {
            if outcome.build_succeeded == Some(false) {
                std::process::exit(EXIT_BUILD_FAILED);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("\n{} {:#}", "FAILED".red().bold(), e);
            let code = if e.downcast_ref::<ReplayError>().is_some() {
                EXIT_BAD_INPUT
            } else {
                1
            };
            std::process::exit(code);
        }
    }
}

/// Load the explicit `--config` file, or discover the nearest `buildlog.yaml`.
fn load_config(cli: &Cli) -> Result<LoggerConfig> {
    if let Some(path) = &cli.config {
        return Ok(LoggerConfig::load(path)?);
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let (config, path) = LoggerConfig::discover(&cwd)?;
    match path {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
        None => tracing::debug!("no buildlog.yaml found, using defaults"),
    }
    Ok(config)
}

/// Decide whether to color output. `auto` honors `NO_COLOR` and only colors
/// a terminal.
fn resolve_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
        }
    }
}
