//! Patch command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relflow_core::{EnvPatch, PatchKind, patch_file, read_version};

/// Arguments for the patch command.
#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Version to write (defaults to the manifest version)
    #[arg(long = "version", value_name = "VERSION")]
    pub value: Option<String>,

    /// Manifest to read the version from
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Deployment config to patch
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// Show what would change without writing the file
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Runs the patch command.
pub fn run(args: &PatchArgs) -> Result<()> {
    let loaded = super::load_config()?;
    let config = &loaded.config;
    let target = super::pick_path(&loaded, args.target.as_deref(), &config.target.path);

    let version = match &args.value {
        Some(version) => version.clone(),
        None => {
            let manifest =
                super::pick_path(&loaded, args.manifest.as_deref(), &config.manifest.path);
            read_version(&manifest)
                .with_context(|| format!("failed to read version from {}", manifest.display()))?
        }
    };

    let patch = EnvPatch::new(&config.target.section, &config.target.key);
    let outcome = patch_file(&target, &patch, &version, !args.dry_run)
        .with_context(|| format!("failed to patch {}", target.display()))?;

    let field = format!("{}.{}", patch.section(), patch.key());
    if args.dry_run {
        println!(
            "Would update {}: {field} = {version} ({})",
            target.display(),
            outcome.kind
        );
    } else if outcome.kind == PatchKind::Unchanged {
        println!("Unchanged {}: {field} is already {version}", target.display());
    } else {
        println!("Updated {}: {field} = {version}", target.display());
    }

    Ok(())
}
