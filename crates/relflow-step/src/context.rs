//! Context shared between steps.

use std::path::PathBuf;

/// Shared state passed to every step during the release pipeline.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Directory the external tools run in.
    pub workdir: PathBuf,

    /// The version read from the manifest.
    pub version: String,

    /// Whether this is a dry run (no actual changes).
    pub dry_run: bool,
}

impl StepContext {
    /// Creates a new step context.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            version: version.into(),
            dry_run: false,
        }
    }

    /// Sets the dry run flag.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the version tag string (e.g., "v1.2.3").
    #[must_use]
    pub fn tag(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.version)
    }
}
