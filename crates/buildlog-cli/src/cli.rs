use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use buildlog_core::config::{ColorChoice, ProgressMode};

use crate::commands::{init::InitArgs, replay::ReplayArgs};

/// buildlog: console progress and summaries for build event streams
///
/// Consumes build lifecycle events and prints one marker per finished
/// project, followed by a run summary with every error and warning.
#[derive(Parser, Debug)]
#[command(name = "buildlog", version, about, long_about = None)]
pub struct Cli {
    /// Increase output verbosity (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to buildlog.yaml (default: nearest one at or above the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// When to use colors (overrides the `color` config key)
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorArg>,

    /// Write diagnostic logs to daily rolling files in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Verbosity level resolved from --verbose / --quiet flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// --quiet: only the build output itself
    Quiet,
    /// default: normal output
    Normal,
    /// --verbose: extra debug info
    Verbose,
}

impl Cli {
    /// Resolve the verbosity level from CLI flags
    pub fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.verbose) {
            (true, _) => Verbosity::Quiet,
            (_, true) => Verbosity::Verbose,
            _ => Verbosity::Normal,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressArg {
    Dots,
    Bar,
    None,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Dots => ProgressMode::Dots,
            ProgressArg::Bar => ProgressMode::Bar,
            ProgressArg::None => ProgressMode::None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded JSON-lines event stream through the logger
    Replay(ReplayArgs),

    /// Write a default buildlog.yaml
    Init(InitArgs),

    /// Generate shell completion scripts
    Completion(CompletionArgs),
}

/// Arguments for the `completion` command
#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
