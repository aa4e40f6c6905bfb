//! Step error types.

use thiserror::Error;

/// Step-related errors.
#[derive(Debug, Error)]
pub enum StepError {
    /// The external program could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The external program exited with a non-zero status.
    #[error("step '{step}' failed: '{program}' exited with {}", describe_code(.code.as_ref()))]
    Failed {
        /// Step name.
        step: String,
        /// Program that was invoked.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },
}

fn describe_code(code: Option<&i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = StepError::Failed {
            step: "publish".to_string(),
            program: "cargo".to_string(),
            code: Some(101),
        };
        assert_eq!(
            err.to_string(),
            "step 'publish' failed: 'cargo' exited with status 101"
        );
    }

    #[test]
    fn test_failed_by_signal_display() {
        let err = StepError::Failed {
            step: "changelog".to_string(),
            program: "git".to_string(),
            code: None,
        };
        assert_eq!(
            err.to_string(),
            "step 'changelog' failed: 'git' exited with no status (terminated by signal)"
        );
    }

    #[test]
    fn test_spawn_display() {
        let err = StepError::Spawn {
            program: "git-cliff".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to run 'git-cliff': not found");
    }

    #[test]
    fn test_error_is_debug() {
        let err = StepError::Failed {
            step: "bump".to_string(),
            program: "cargo".to_string(),
            code: Some(1),
        };
        let debug = format!("{err:?}");
        assert!(debug.contains("Failed"));
    }
}
