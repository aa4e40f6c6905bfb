//! Version command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the version command.
#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Manifest to read the version from
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

/// Runs the version command.
pub fn run(args: &VersionArgs) -> Result<()> {
    let loaded = super::load_config()?;
    let manifest = super::pick_path(
        &loaded,
        args.manifest.as_deref(),
        &loaded.config.manifest.path,
    );

    let version = relflow_core::read_version(&manifest)
        .with_context(|| format!("failed to read version from {}", manifest.display()))?;
    println!("{version}");

    Ok(())
}
