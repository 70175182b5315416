use mockall::automock;
use std::time::Duration;
use thiserror::Error;

/// A runner that calls the `git` binary.
pub mod git;

/// The result of a finished command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// The exit code, -1 if the process was terminated by a signal.
    pub code: i32,
    /// The stdout and stderr interleaved, without the trailing whitespace.
    pub output: String,
}

impl CommandOutput {
    pub fn new(code: i32, output: &str) -> Self {
        CommandOutput {
            code,
            output: String::from(output),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// A custom error for describing why a command could not produce an output.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be started or waited on.
    #[error("the command cannot run: {0}")]
    ProcessFailure(#[from] std::io::Error),
    /// The command output contains non-UTF8 characters.
    #[error("the command returned invalid characters")]
    NonUtf8Return,
    /// The command did not finish before the deadline and was killed.
    #[error("the command did not finish in {0:?}")]
    Timeout(Duration),
}

/// A command runner executes an argument list in a working directory.
///
/// A non-zero exit code is not an error, it is returned in the [CommandOutput]
/// so the caller can decide on the policy. Only failing to get an output is an error.
#[automock]
pub trait CommandRunner: Send + Sync {
    fn run(&self, args: &[String], directory: &str) -> Result<CommandOutput, RunnerError>;
}
