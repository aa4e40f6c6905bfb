//! External step trait.

use tracing::info;

use super::Plugin;
use crate::{CommandRunner, StepContext, StepError, StepResult};

/// A pipeline step backed by a single external executable.
///
/// Implementors only describe the command line; [`ExternalStep::execute`]
/// runs it and turns a non-zero exit status into [`StepError::Failed`].
pub trait ExternalStep: Plugin {
    /// Program to invoke.
    fn program(&self) -> &'static str;

    /// Arguments for the program.
    fn args(&self, ctx: &StepContext) -> Vec<String>;

    /// Runs the step through `runner` and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started or exits with a
    /// non-zero status.
    fn execute(&self, ctx: &StepContext, runner: &dyn CommandRunner) -> StepResult<()> {
        let args = self.args(ctx);
        info!(
            step = self.name(),
            step_version = self.version(),
            program = self.program(),
            ?args,
            "running step"
        );

        let status = runner.run(self.program(), &args, &ctx.workdir)?;
        if status.success() {
            Ok(())
        } else {
            Err(StepError::Failed {
                step: self.name().to_string(),
                program: self.program().to_string(),
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExitStatus, RecordingRunner};

    struct EchoStep;

    impl Plugin for EchoStep {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn version(&self) -> &'static str {
            "1.0.0"
        }
    }

    impl ExternalStep for EchoStep {
        fn program(&self) -> &'static str {
            "echo"
        }

        fn args(&self, ctx: &StepContext) -> Vec<String> {
            vec![ctx.version.clone()]
        }
    }

    #[test]
    fn test_execute_success() {
        let runner = RecordingRunner::new();
        let ctx = StepContext::new("/tmp/work", "1.2.3");

        EchoStep.execute(&ctx, &runner).unwrap();

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].command_line(), "echo 1.2.3");
        assert_eq!(invocations[0].cwd, ctx.workdir);
    }

    #[test]
    fn test_execute_non_zero_exit() {
        let runner = RecordingRunner::new().with_status("echo", ExitStatus::from_code(2));
        let ctx = StepContext::new(".", "1.2.3");

        let err = EchoStep.execute(&ctx, &runner).unwrap_err();
        match err {
            StepError::Failed {
                step,
                program,
                code,
            } => {
                assert_eq!(step, "echo");
                assert_eq!(program, "echo");
                assert_eq!(code, Some(2));
            }
            StepError::Spawn { .. } => panic!("expected Failed error"),
        }
    }
}
