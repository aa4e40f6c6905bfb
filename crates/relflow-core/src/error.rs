//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while editing the deployment config text.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The document is not valid YAML.
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document root is a sequence or a scalar.
    #[error("document root is not a mapping")]
    RootNotAMapping,

    /// The section holds a scalar value.
    #[error("`{0}` is not a mapping")]
    SectionNotAMapping(String),

    /// The section is written in a form that cannot be edited in place.
    #[error("cannot edit `{section}` in place: {reason}")]
    UnsupportedLayout {
        /// Section name.
        section: String,
        /// What made the layout unsupported.
        reason: String,
    },

    /// The edited text does not read back as expected.
    #[error("patched document failed verification: {0}")]
    Verification(String),
}

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Manifest has no `version = "..."` line.
    #[error("no version field found in {}", .path.display())]
    MissingField {
        /// Manifest path.
        path: PathBuf,
    },

    /// Manifest file does not exist.
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// Deployment config file does not exist.
    #[error("target config not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    /// Deployment config could not be patched.
    #[error("failed to patch {}: {source}", .path.display())]
    Patch {
        /// Target path.
        path: PathBuf,
        /// Underlying patch error.
        #[source]
        source: PatchError,
    },

    /// External step error.
    #[error("step error: {0}")]
    Step(#[from] relflow_step::StepError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
