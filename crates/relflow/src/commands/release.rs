//! Release command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use relflow_bumper_cargo_release::{BumpLevel, CargoReleaseBumper};
use relflow_changelog_git_cliff::GitCliffChangelog;
use relflow_config::LoadedConfig;
use relflow_core::{EnvPatch, PatchKind, Pipeline, PipelineEvent};
use relflow_publisher_cargo::CargoPublisher;
use relflow_step::{CommandRunner, DryRunRunner, SystemRunner};

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Perform a dry run without running tools or writing files
    #[arg(short, long)]
    pub dry_run: bool,

    /// Bump the version with cargo-release (major, minor, patch, release, rc, beta, alpha)
    #[arg(long, value_name = "LEVEL", num_args = 0..=1, default_missing_value = "patch")]
    pub bump: Option<BumpLevel>,

    /// Regenerate the changelog with git-cliff
    #[arg(long)]
    pub changelog: bool,

    /// Publish the package with cargo publish
    #[arg(long)]
    pub publish: bool,

    /// Manifest to read the version from
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Deployment config to patch
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,
}

/// Assembles the pipeline from the configuration and the command-line flags.
///
/// Flags only ever enable steps; a step enabled in the configuration stays on.
fn build_pipeline(loaded: &LoadedConfig, args: &ReleaseArgs) -> Result<Pipeline> {
    let config = &loaded.config;
    let manifest = super::pick_path(loaded, args.manifest.as_deref(), &config.manifest.path);
    let target = super::pick_path(loaded, args.target.as_deref(), &config.target.path);

    let mut pipeline = Pipeline::new(&loaded.root, manifest, target)
        .with_patch(EnvPatch::new(&config.target.section, &config.target.key))
        .dry_run(args.dry_run);

    let level = match args.bump {
        Some(level) => Some(level),
        None if config.bump.enabled => Some(
            config
                .bump
                .level
                .parse::<BumpLevel>()
                .context("invalid [bump] level in configuration")?,
        ),
        None => None,
    };
    if let Some(level) = level {
        pipeline = pipeline.with_bumper(Box::new(CargoReleaseBumper::new().with_level(level)));
    }

    if args.changelog || config.changelog.enabled {
        let mut step = GitCliffChangelog::new().with_output(&config.changelog.output);
        if !config.changelog.tag_prefix.is_empty() {
            step = step.with_tag_prefix(&config.changelog.tag_prefix);
        }
        pipeline = pipeline.with_changelog(Box::new(step));
    }

    if args.publish || config.publish.enabled {
        let mut step = CargoPublisher::new().with_allow_dirty(config.publish.allow_dirty);
        if let Some(registry) = &config.publish.registry {
            step = step.with_registry(registry);
        }
        pipeline = pipeline.with_publisher(Box::new(step));
    }

    Ok(pipeline)
}

/// Runs the release command.
pub fn run(args: &ReleaseArgs) -> Result<()> {
    let loaded = super::load_config()?;
    let pipeline = build_pipeline(&loaded, args)?;
    let field = format!("{}.{}", loaded.config.target.section, loaded.config.target.key);

    info!(
        steps = ?pipeline.enabled_steps(),
        dry_run = args.dry_run,
        "starting release pipeline"
    );
    if args.dry_run {
        println!("Dry run: no tools will run and no files will be written.\n");
    }

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner)
    };

    pipeline
        .run(runner.as_ref(), |event| print_event(event, &field, args.dry_run))
        .context("release pipeline failed")?;

    Ok(())
}

fn print_event(event: &PipelineEvent, field: &str, dry_run: bool) {
    match event {
        PipelineEvent::VersionRead { version } => println!("Current version: {version}"),
        PipelineEvent::StepStarted { step, description } if description.is_empty() => {
            println!("Running {step} step...");
        }
        PipelineEvent::StepStarted { step, description } => {
            println!("Running {step} step: {description}");
        }
        PipelineEvent::StepFinished { .. } => {}
        PipelineEvent::VersionResolved { version } => println!("New version: {version}"),
        PipelineEvent::ConfigPatched { outcome, version } => {
            let path = outcome.path.display();
            if dry_run {
                println!("Would update {path}: {field} = {version}");
            } else if outcome.kind == PatchKind::Unchanged {
                println!("Unchanged {path}: {field} is already {version}");
            } else {
                println!("Updated {path}: {field} = {version}");
            }
        }
        PipelineEvent::Done => {
            if dry_run {
                println!("Dry run complete. No changes were made.");
            } else {
                println!("Release pipeline complete!");
            }
        }
    }
}
