//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so we can
//! test state functions without spawning real processes.

use crate::HalResult;

/// How a non-zero exit code is interpreted by [`ProcessOps::run_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// A non-zero exit becomes [`crate::HalError::CommandFailed`].
    Check,
    /// The output is returned as-is and the caller interprets `exit_code`.
    Ignore,
}

/// Captured result of a command run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output with surrounding whitespace trimmed.
    pub stdout: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A fully constructed command line, kept separate from execution so it can be
/// asserted on in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Program followed by its arguments, ready for [`ProcessOps::run_command`].
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run `argv[0]` with the remaining arguments and capture stdout.
    fn run_command(&self, argv: &[&str], policy: ExitPolicy) -> HalResult<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_puts_program_first() {
        let spec = CommandSpec {
            program: "blockdev".to_string(),
            args: vec!["--setra".to_string(), "256".to_string()],
        };
        assert_eq!(spec.argv(), vec!["blockdev", "--setra", "256"]);
    }

    #[test]
    fn signal_terminated_output_is_not_success() {
        assert!(CommandOutput::new("", Some(0)).success());
        assert!(!CommandOutput::new("", Some(2)).success());
        assert!(!CommandOutput::new("", None).success());
    }
}
