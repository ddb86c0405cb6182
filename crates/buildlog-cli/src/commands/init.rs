use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use buildlog_core::config::{CONFIG_FILE_NAME, LoggerConfig};

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write buildlog.yaml into (default: current directory)
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Overwrite an existing buildlog.yaml
    #[arg(long)]
    pub force: bool,
}

/// Write a buildlog.yaml holding the default settings
pub fn run(args: InitArgs) -> Result<()> {
    let dir = match args.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let path = write_default_config(&dir, args.force)?;
    println!("{} Wrote {}", "+".green(), path.display());
    Ok(())
}

fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let yaml = LoggerConfig::default()
        .to_yaml()
        .context("Failed to serialize default config")?;
    std::fs::write(&path, yaml)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
