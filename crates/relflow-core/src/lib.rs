//! Core library for Relflow.
//!
//! This crate reads the package version from a manifest, patches it into a
//! deployment config, and drives the release pipeline around the external
//! tool steps.

mod error;
mod manifest;
mod patch;
mod pipeline;

pub use error::{CoreError, CoreResult, PatchError, PatchResult};
pub use manifest::{parse_version, read_version};
pub use patch::{
    DEFAULT_KEY, DEFAULT_SECTION, EnvPatch, PatchKind, PatchOutcome, Patched, patch_environment,
    patch_file,
};
pub use pipeline::{Pipeline, PipelineEvent, PipelineReport};
