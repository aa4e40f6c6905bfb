//! Subcommands.

pub mod init;
pub mod patch;
pub mod release;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relflow_config::{LoadedConfig, find_and_load_config};
use tracing::debug;

/// Loads `relflow.toml` from the current directory or its parents.
fn load_config() -> Result<LoadedConfig> {
    let loaded = find_and_load_config().context("failed to load configuration")?;
    debug!(source = ?loaded.source, root = ?loaded.root, "configuration loaded");
    Ok(loaded)
}

/// Picks the command-line path if given, else the configured one.
///
/// Command-line paths are used as given; configured paths resolve against
/// the configuration root.
fn pick_path(loaded: &LoadedConfig, cli: Option<&Path>, configured: &str) -> PathBuf {
    cli.map_or_else(|| loaded.resolve(configured), Path::to_path_buf)
}
