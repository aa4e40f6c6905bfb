//! Process runners.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::{StepError, StepResult};

/// Exit status of an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
}

impl ExitStatus {
    /// Successful exit.
    pub const SUCCESS: Self = Self { code: Some(0) };

    /// Creates an exit status from a process exit code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Exit status of a process killed by a signal.
    #[must_use]
    pub fn terminated() -> Self {
        Self { code: None }
    }

    /// Returns true if the program exited with status 0.
    #[must_use]
    pub fn success(self) -> bool {
        self.code == Some(0)
    }

    /// Returns the exit code, if any.
    #[must_use]
    pub fn code(self) -> Option<i32> {
        self.code
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Runs an external program to completion.
pub trait CommandRunner {
    /// Runs `program` with `args` inside `cwd` and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> StepResult<ExitStatus>;
}

/// Runs programs through the operating system, inheriting stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> StepResult<ExitStatus> {
        debug!(program, ?args, ?cwd, "running command");

        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .status()
            .map_err(|source| StepError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let status = ExitStatus::from(status);
        if !status.success() {
            warn!(program, code = ?status.code(), "command exited unsuccessfully");
        }

        Ok(status)
    }
}

/// Logs commands instead of running them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> StepResult<ExitStatus> {
        info!(
            command = %command_line(program, args),
            ?cwd,
            "dry run: skipping command"
        );
        Ok(ExitStatus::SUCCESS)
    }
}

/// A command that was handed to a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Invocation {
    /// Returns the program and its arguments joined by spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        command_line(&self.program, &self.args)
    }
}

/// Records invocations without running anything.
///
/// Every command succeeds unless a scripted status matches the start of its
/// command line, e.g. `with_status("cargo publish", 101)`.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    invocations: RefCell<Vec<Invocation>>,
    statuses: Vec<(String, ExitStatus)>,
}

impl RecordingRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the exit status for commands starting with `prefix`.
    #[must_use]
    pub fn with_status(mut self, prefix: impl Into<String>, status: ExitStatus) -> Self {
        self.statuses.push((prefix.into(), status));
        self
    }

    /// Returns the recorded invocations.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Returns the recorded command lines.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> StepResult<ExitStatus> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        };
        let line = invocation.command_line();
        self.invocations.borrow_mut().push(invocation);

        let status = self
            .statuses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or(ExitStatus::SUCCESS, |(_, status)| *status);

        Ok(status)
    }
}

fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
