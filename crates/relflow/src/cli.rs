//! CLI definition.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Release a Rust package and stamp its version into the deployment config.
#[derive(Debug, Parser)]
#[command(name = "relflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new relflow configuration
    Init(commands::init::InitArgs),

    /// Print the manifest version
    Version(commands::version::VersionArgs),

    /// Write the version into the deployment config
    Patch(commands::patch::PatchArgs),

    /// Run the release pipeline (bump, changelog, patch, publish)
    Release(commands::release::ReleaseArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args) => commands::init::run(&args),
            Commands::Version(args) => commands::version::run(&args),
            Commands::Patch(args) => commands::patch::run(&args),
            Commands::Release(args) => commands::release::run(&args),
        }
    }
}
