//! Step traits.

pub mod step;

/// Base trait for all steps.
pub trait Plugin: Send + Sync {
    /// Returns the step name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Returns the step version.
    fn version(&self) -> &'static str;

    /// Returns a short description of the step.
    fn description(&self) -> &'static str {
        ""
    }
}

