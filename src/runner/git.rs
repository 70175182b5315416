use super::{CommandOutput, CommandRunner, RunnerError};
use duct::cmd;
use log::trace;
use std::{
    process::Output,
    thread::sleep,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A runner that calls the git binary with the arguments.
///
/// Both stdout and stderr are captured into the same output. Git never prompts
/// for credentials, a push that needs them fails instead of hanging the queue.
/// If there is a timeout, the command is killed after it.
pub struct GitRunner {
    program: String,
    timeout: Option<Duration>,
}

impl GitRunner {
    /// Creates a new runner with the git binary (e.g. "git" or "/usr/bin/git").
    pub fn new(program: String) -> Self {
        GitRunner {
            program,
            timeout: None,
        }
    }

    /// Creates a new runner that kills the commands after the timeout.
    pub fn new_with_timeout(program: String, timeout: Duration) -> Self {
        GitRunner {
            program,
            timeout: Some(timeout),
        }
    }

    fn collect(output: &Output) -> Result<CommandOutput, RunnerError> {
        let output_str =
            std::str::from_utf8(&output.stdout).map_err(|_| RunnerError::NonUtf8Return)?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            output: output_str.trim_end().to_string(),
        })
    }
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new(String::from("git"))
    }
}

impl CommandRunner for GitRunner {
    fn run(&self, args: &[String], directory: &str) -> Result<CommandOutput, RunnerError> {
        trace!("Running {} {} in {directory}.", self.program, args.join(" "));

        let handle = cmd(self.program.as_str(), args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .dir(directory)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()?;

        let Some(timeout) = self.timeout else {
            return Self::collect(handle.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait()? {
                return Self::collect(output);
            }
            if Instant::now() >= deadline {
                handle.kill()?;
                return Err(RunnerError::Timeout(timeout));
            }
            sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duct::cmd;
    use rand::distributions::{Alphanumeric, DistString};
    use std::{error::Error, fs};

    fn get_random_id() -> String {
        Alphanumeric.sample_string(&mut rand::thread_rng(), 16)
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn it_should_be_created_with_git() {
        let runner = GitRunner::default();

        assert_eq!("git", runner.program);
        assert_eq!(None, runner.timeout);
    }

    #[test]
    fn it_should_return_the_output() -> Result<(), Box<dyn Error>> {
        let runner = GitRunner::default();

        let output = runner.run(&args(&["--version"]), ".")?;
        assert!(output.success());
        assert!(output.output.starts_with("git version"), "{output:?}");

        Ok(())
    }

    #[test]
    fn it_should_return_non_zero_exit_codes_with_the_error_output() -> Result<(), Box<dyn Error>> {
        let runner = GitRunner::default();

        let output = runner.run(&args(&["no-such-subcommand"]), ".")?;
        assert!(!output.success());
        assert!(output.output.contains("no-such-subcommand"), "{output:?}");

        Ok(())
    }

    #[test]
    fn it_should_run_in_the_directory() -> Result<(), Box<dyn Error>> {
        let id = get_random_id();
        let local = format!("test_directories/{id}");
        fs::create_dir_all(&local)?;
        cmd!("git", "init").dir(&local).read()?;
        cmd!("git", "remote", "add", "origin", "https://github.com/me/notes.git")
            .dir(&local)
            .read()?;

        let runner = GitRunner::default();
        let output = runner.run(&args(&["remote", "get-url", "origin"]), &local);

        fs::remove_dir_all(&local)?;

        assert_eq!(
            CommandOutput::new(0, "https://github.com/me/notes.git"),
            output?
        );

        Ok(())
    }

    #[test]
    fn it_should_fail_if_the_binary_does_not_exist() {
        let runner = GitRunner::new(String::from("/path/to/nowhere/git"));

        let result = runner.run(&args(&["status"]), ".");
        assert!(
            matches!(result, Err(RunnerError::ProcessFailure(_))),
            "{result:?} should be ProcessFailure"
        );
    }

    #[test]
    #[cfg(unix)]
    fn it_should_kill_the_command_after_the_timeout() {
        let runner = GitRunner::new_with_timeout(String::from("sleep"), Duration::from_millis(100));

        let start = Instant::now();
        let result = runner.run(&args(&["5"]), ".");

        assert!(
            matches!(result, Err(RunnerError::Timeout(_))),
            "{result:?} should be Timeout"
        );
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
