//! git-cliff changelog step.

use relflow_step::{ExternalStep, Plugin, StepContext};

/// Default changelog output file.
pub const DEFAULT_OUTPUT: &str = "CHANGELOG.md";

/// Regenerates the changelog from commit history with `git cliff -o <output>`.
///
/// When a tag prefix is set, the unreleased commits are attributed to the
/// release tag via `--tag <prefix><version>`.
#[derive(Debug)]
pub struct GitCliffChangelog {
    output: String,
    tag_prefix: Option<String>,
}

impl GitCliffChangelog {
    /// Creates a step writing to `CHANGELOG.md`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: DEFAULT_OUTPUT.to_string(),
            tag_prefix: None,
        }
    }

    /// Sets the output file.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Tags the unreleased section with `<prefix><version>`.
    #[must_use]
    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = Some(prefix.into());
        self
    }

    /// Returns the output file.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Default for GitCliffChangelog {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for GitCliffChangelog {
    fn name(&self) -> &'static str {
        "changelog"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Regenerates the changelog from commit history with git-cliff"
    }
}

impl ExternalStep for GitCliffChangelog {
    fn program(&self) -> &'static str {
        "git"
    }

    fn args(&self, ctx: &StepContext) -> Vec<String> {
        let mut args = vec!["cliff".to_string(), "-o".to_string(), self.output.clone()];
        if let Some(prefix) = &self.tag_prefix {
            args.push("--tag".to_string());
            args.push(ctx.tag(prefix));
        }
        args
    }
}
