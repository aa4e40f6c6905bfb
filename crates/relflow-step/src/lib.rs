//! External tool steps for Relflow.
//!
//! This crate provides the step traits and process plumbing:
//! - [`Plugin`]: Base trait for all steps
//! - [`ExternalStep`]: A single external executable invocation
//! - [`CommandRunner`]: Runs a program and reports its exit status
//! - [`StepContext`]: Shared state passed to each step

mod context;
mod error;
mod runner;
mod traits;

pub use context::StepContext;
pub use error::{StepError, StepResult};
pub use runner::{CommandRunner, DryRunRunner, ExitStatus, Invocation, RecordingRunner, SystemRunner};
pub use traits::Plugin;
pub use traits::step::ExternalStep;
