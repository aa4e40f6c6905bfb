//! cargo publish step.

use relflow_step::{ExternalStep, Plugin, StepContext};

/// Publishes the crate with `cargo publish`.
pub struct CargoPublisher {
    /// Registry to publish to.
    registry: Option<String>,
    /// Publish with uncommitted changes (the patched config file).
    allow_dirty: bool,
}

impl CargoPublisher {
    /// Creates a publisher targeting crates.io.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: None,
            allow_dirty: false,
        }
    }

    /// Sets the registry to publish to.
    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Allows publishing from a dirty working tree.
    #[must_use]
    pub fn with_allow_dirty(mut self, allow_dirty: bool) -> Self {
        self.allow_dirty = allow_dirty;
        self
    }

    /// Returns the registry, if set.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }
}

impl Default for CargoPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CargoPublisher {
    fn name(&self) -> &'static str {
        "publish"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Publishes the crate with cargo publish"
    }
}

impl ExternalStep for CargoPublisher {
    fn program(&self) -> &'static str {
        "cargo"
    }

    fn args(&self, _ctx: &StepContext) -> Vec<String> {
        let mut args = vec!["publish".to_string()];
        if let Some(registry) = &self.registry {
            args.push("--registry".to_string());
            args.push(registry.clone());
        }
        if self.allow_dirty {
            args.push("--allow-dirty".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use relflow_step::{ExitStatus, RecordingRunner, StepError};

    use super::*;

    fn ctx() -> StepContext {
        StepContext::new("/tmp/test", "1.1.0")
    }

    #[test]
    fn test_new() {
        let publisher = CargoPublisher::new();
        assert!(publisher.registry().is_none());
        assert_eq!(publisher.args(&ctx()), vec!["publish"]);
    }

    #[test]
    fn test_with_registry() {
        let publisher = CargoPublisher::new().with_registry("my-registry");
        assert_eq!(publisher.registry(), Some("my-registry"));
        assert_eq!(
            publisher.args(&ctx()),
            vec!["publish", "--registry", "my-registry"]
        );
    }

    #[test]
    fn test_with_allow_dirty() {
        let publisher = CargoPublisher::new()
            .with_registry("private")
            .with_allow_dirty(true);
        assert_eq!(
            publisher.args(&ctx()),
            vec!["publish", "--registry", "private", "--allow-dirty"]
        );
    }

    #[test]
    fn test_plugin_metadata() {
        let publisher = CargoPublisher::new();
        assert_eq!(publisher.name(), "publish");
        assert_eq!(publisher.version(), env!("CARGO_PKG_VERSION"));
        assert!(publisher.description().contains("cargo publish"));
    }

    #[test]
    fn test_execute_runs_in_workdir() {
        let runner = RecordingRunner::new();
        CargoPublisher::new().execute(&ctx(), &runner).unwrap();

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].command_line(), "cargo publish");
        assert_eq!(invocations[0].cwd.to_string_lossy(), "/tmp/test");
    }

    #[test]
    fn test_execute_failure() {
        let runner = RecordingRunner::new().with_status("cargo publish", ExitStatus::from_code(101));
        let result = CargoPublisher::new().execute(&ctx(), &runner);
        assert!(matches!(result, Err(StepError::Failed { code: Some(101), .. })));
    }
}
