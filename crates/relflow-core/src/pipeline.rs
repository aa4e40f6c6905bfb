//! Release pipeline driver.

use std::path::{Path, PathBuf};

use relflow_step::{CommandRunner, ExternalStep, StepContext};
use tracing::info;

use crate::patch::{EnvPatch, PatchOutcome, patch_file};
use crate::{CoreResult, read_version};

/// Progress notifications emitted while the pipeline runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The manifest version was read.
    VersionRead {
        /// Version found in the manifest.
        version: String,
    },
    /// An external step is about to run.
    StepStarted {
        /// Step name.
        step: String,
        /// What the step does, empty when the step has no description.
        description: String,
    },
    /// An external step exited successfully.
    StepFinished {
        /// Step name.
        step: String,
    },
    /// The version the rest of the pipeline works with.
    VersionResolved {
        /// Version after the optional bump.
        version: String,
    },
    /// The deployment config was patched.
    ConfigPatched {
        /// What the patch did.
        outcome: PatchOutcome,
        /// Version written.
        version: String,
    },
    /// Every step completed.
    Done,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Version read before any step ran.
    pub initial_version: String,
    /// Version written to the deployment config.
    pub version: String,
    /// Result of the patch step.
    pub patch: PatchOutcome,
    /// Names of the external steps that ran, in order.
    pub steps_run: Vec<String>,
}

impl PipelineReport {
    /// Returns true if the bump step changed the manifest version.
    #[must_use]
    pub fn bumped(&self) -> bool {
        self.initial_version != self.version
    }
}

/// Runs read, bump, changelog, patch and publish in that order.
///
/// The first failing step aborts the run; later steps never start.
pub struct Pipeline {
    workdir: PathBuf,
    manifest: PathBuf,
    target: PathBuf,
    patch: EnvPatch,
    bumper: Option<Box<dyn ExternalStep>>,
    changelog: Option<Box<dyn ExternalStep>>,
    publisher: Option<Box<dyn ExternalStep>>,
    dry_run: bool,
}

impl Pipeline {
    /// Creates a pipeline with only the read and patch steps enabled.
    #[must_use]
    pub fn new(
        workdir: impl Into<PathBuf>,
        manifest: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            manifest: manifest.into(),
            target: target.into(),
            patch: EnvPatch::default(),
            bumper: None,
            changelog: None,
            publisher: None,
            dry_run: false,
        }
    }

    /// Sets the section and key to patch.
    #[must_use]
    pub fn with_patch(mut self, patch: EnvPatch) -> Self {
        self.patch = patch;
        self
    }

    /// Enables the version bump step.
    #[must_use]
    pub fn with_bumper(mut self, step: Box<dyn ExternalStep>) -> Self {
        self.bumper = Some(step);
        self
    }

    /// Enables the changelog step.
    #[must_use]
    pub fn with_changelog(mut self, step: Box<dyn ExternalStep>) -> Self {
        self.changelog = Some(step);
        self
    }

    /// Enables the publish step.
    #[must_use]
    pub fn with_publisher(mut self, step: Box<dyn ExternalStep>) -> Self {
        self.publisher = Some(step);
        self
    }

    /// Leaves the deployment config untouched on disk.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the manifest path.
    #[must_use]
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Returns the deployment config path.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Returns the names of the enabled external steps, in run order.
    #[must_use]
    pub fn enabled_steps(&self) -> Vec<&str> {
        [&self.bumper, &self.changelog, &self.publisher]
            .into_iter()
            .flatten()
            .map(|step| step.name())
            .collect()
    }

    /// Runs the pipeline, reporting progress through `on_event`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails.
    pub fn run<F>(&self, runner: &dyn CommandRunner, mut on_event: F) -> CoreResult<PipelineReport>
    where
        F: FnMut(&PipelineEvent),
    {
        let initial_version = read_version(&self.manifest)?;
        info!(version = %initial_version, manifest = ?self.manifest, "read version");
        on_event(&PipelineEvent::VersionRead {
            version: initial_version.clone(),
        });

        let mut steps_run = Vec::new();
        let mut version = initial_version.clone();

        if let Some(bumper) = &self.bumper {
            self.run_step(bumper.as_ref(), &version, runner, &mut steps_run, &mut on_event)?;
            // The bump tool rewrites the manifest; downstream steps need its result.
            version = read_version(&self.manifest)?;
            if version != initial_version {
                info!(from = %initial_version, to = %version, "version bumped");
            }
        }
        on_event(&PipelineEvent::VersionResolved {
            version: version.clone(),
        });

        if let Some(changelog) = &self.changelog {
            self.run_step(changelog.as_ref(), &version, runner, &mut steps_run, &mut on_event)?;
        }

        let patch = patch_file(&self.target, &self.patch, &version, !self.dry_run)?;
        on_event(&PipelineEvent::ConfigPatched {
            outcome: patch.clone(),
            version: version.clone(),
        });

        if let Some(publisher) = &self.publisher {
            self.run_step(publisher.as_ref(), &version, runner, &mut steps_run, &mut on_event)?;
        }

        info!(%version, steps = steps_run.len(), "release pipeline complete");
        on_event(&PipelineEvent::Done);

        Ok(PipelineReport {
            initial_version,
            version,
            patch,
            steps_run,
        })
    }

    fn run_step<F>(
        &self,
        step: &dyn ExternalStep,
        version: &str,
        runner: &dyn CommandRunner,
        steps_run: &mut Vec<String>,
        on_event: &mut F,
    ) -> CoreResult<()>
    where
        F: FnMut(&PipelineEvent),
    {
        let name = step.name().to_string();
        on_event(&PipelineEvent::StepStarted {
            step: name.clone(),
            description: step.description().to_string(),
        });

        let ctx = StepContext::new(&self.workdir, version).dry_run(self.dry_run);
        step.execute(&ctx, runner)?;

        on_event(&PipelineEvent::StepFinished { step: name.clone() });
        steps_run.push(name);
        Ok(())
    }
}
