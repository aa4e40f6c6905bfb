//! cargo-release version bump step.

use std::fmt;
use std::str::FromStr;

use relflow_step::{ExternalStep, Plugin, StepContext};
use thiserror::Error;

/// Level passed to `cargo release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BumpLevel {
    /// Increment the major component.
    Major,
    /// Increment the minor component.
    Minor,
    /// Increment the patch component.
    #[default]
    Patch,
    /// Drop the pre-release suffix.
    Release,
    /// Release candidate pre-release.
    Rc,
    /// Beta pre-release.
    Beta,
    /// Alpha pre-release.
    Alpha,
}

impl BumpLevel {
    /// Returns the level as understood by `cargo release`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Release => "release",
            Self::Rc => "rc",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown bump level.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown bump level '{0}' (expected major, minor, patch, release, rc, beta or alpha)")]
pub struct ParseBumpLevelError(String);

impl FromStr for BumpLevel {
    type Err = ParseBumpLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "release" => Ok(Self::Release),
            "rc" => Ok(Self::Rc),
            "beta" => Ok(Self::Beta),
            "alpha" => Ok(Self::Alpha),
            _ => Err(ParseBumpLevelError(s.to_string())),
        }
    }
}

/// Bumps the manifest version with `cargo release <level> --execute --no-confirm`.
///
/// cargo-release rewrites the manifest and commits the change; the pipeline
/// reads the manifest again afterwards.
#[derive(Debug, Default)]
pub struct CargoReleaseBumper {
    level: BumpLevel,
}

impl CargoReleaseBumper {
    /// Creates a patch-level bumper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bump level.
    #[must_use]
    pub fn with_level(mut self, level: BumpLevel) -> Self {
        self.level = level;
        self
    }

    /// Returns the bump level.
    #[must_use]
    pub fn level(&self) -> BumpLevel {
        self.level
    }
}

impl Plugin for CargoReleaseBumper {
    fn name(&self) -> &'static str {
        "bump"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Bumps and commits the crate version with cargo-release"
    }
}

impl ExternalStep for CargoReleaseBumper {
    fn program(&self) -> &'static str {
        "cargo"
    }

    fn args(&self, _ctx: &StepContext) -> Vec<String> {
        vec![
            "release".to_string(),
            self.level.to_string(),
            "--execute".to_string(),
            "--no-confirm".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use relflow_step::{ExitStatus, RecordingRunner, StepError};

    use super::*;

    fn ctx() -> StepContext {
        StepContext::new("/tmp/project", "1.0.0")
    }

    #[test]
    fn test_default_level_is_patch() {
        assert_eq!(CargoReleaseBumper::new().level(), BumpLevel::Patch);
    }

    #[test]
    fn test_args_patch() {
        let bumper = CargoReleaseBumper::new();
        assert_eq!(
            bumper.args(&ctx()),
            vec!["release", "patch", "--execute", "--no-confirm"]
        );
    }

    #[test]
    fn test_args_with_level() {
        let bumper = CargoReleaseBumper::new().with_level(BumpLevel::Minor);
        assert_eq!(bumper.args(&ctx())[1], "minor");
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("major".parse::<BumpLevel>(), Ok(BumpLevel::Major));
        assert_eq!(" Minor ".parse::<BumpLevel>(), Ok(BumpLevel::Minor));
        assert_eq!("rc".parse::<BumpLevel>(), Ok(BumpLevel::Rc));
        assert_eq!("alpha".parse::<BumpLevel>(), Ok(BumpLevel::Alpha));
    }

    #[test]
    fn test_parse_unknown_level() {
        let err = "huge".parse::<BumpLevel>().unwrap_err();
        assert!(err.to_string().contains("unknown bump level 'huge'"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for level in [
            BumpLevel::Major,
            BumpLevel::Minor,
            BumpLevel::Patch,
            BumpLevel::Release,
            BumpLevel::Rc,
            BumpLevel::Beta,
            BumpLevel::Alpha,
        ] {
            assert_eq!(level.to_string().parse::<BumpLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_execute_runs_cargo_release() {
        let runner = RecordingRunner::new();
        CargoReleaseBumper::new().execute(&ctx(), &runner).unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["cargo release patch --execute --no-confirm"]
        );
    }

    #[test]
    fn test_execute_failure() {
        let runner = RecordingRunner::new().with_status("cargo release", ExitStatus::from_code(1));
        let result = CargoReleaseBumper::new().execute(&ctx(), &runner);
        assert!(matches!(result, Err(StepError::Failed { code: Some(1), .. })));
    }

    #[test]
    fn test_plugin_metadata() {
        let bumper = CargoReleaseBumper::new();
        assert_eq!(bumper.name(), "bump");
        assert_eq!(bumper.version(), env!("CARGO_PKG_VERSION"));
        assert!(bumper.description().contains("cargo-release"));
    }
}
