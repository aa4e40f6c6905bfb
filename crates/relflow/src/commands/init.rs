//! Initialize command.

use std::fs;

use anyhow::{Context, Result, bail};
use clap::Args;
use relflow_config::{CONFIG_FILE_NAME, default_config_toml};
use tracing::info;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Runs the init command.
pub fn run(args: &InitArgs) -> Result<()> {
    let path = std::env::current_dir()
        .context("failed to determine current directory")?
        .join(CONFIG_FILE_NAME);

    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let content = default_config_toml().context("failed to render default configuration")?;
    fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(?path, "wrote default configuration");

    println!("Created {CONFIG_FILE_NAME}");
    Ok(())
}
