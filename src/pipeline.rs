use crate::{
    remote::{to_alternate, Transport},
    request::SaveRequest,
    runner::{CommandOutput, CommandRunner, RunnerError},
};
use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;

/// Outputs of a failing commit that mean that the file had no changes.
const NOTHING_TO_COMMIT_PHRASES: &[&str] = &[
    "nothing to commit",
    "nothing added to commit",
    "no changes added to commit",
];

/// Outputs that mean that the remote already has everything.
const UP_TO_DATE_PHRASES: &[&str] = &["up to date", "up-to-date"];

/// The successful end states of the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The changes were committed and pushed (or the remote was already up to date).
    Pushed,
    /// There was nothing to commit, so nothing was pushed.
    NothingToCommit,
    /// The push only succeeded on the other transport, the remote URL now points to it.
    PushedWithFallback(String),
}

/// A custom error describing the failed end states of the pipeline.
///
/// Every variant carries the output of the failing command.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Adding the file to the index failed.
    #[error("cannot stage the file: {0}")]
    StageFailure(String),
    /// Commit failed with something other than having nothing to commit.
    #[error("cannot commit: {0}")]
    CommitFailure(String),
    /// The push failed and we couldn't read the remote to try the fallback.
    #[error("failed to get remote URL: {0}")]
    RemoteFetchFailure(String),
    /// The push failed and we couldn't point the remote to the other transport.
    #[error("failed to set remote URL: {0}")]
    SetUrlFailure(String),
    /// The push failed and there is no other transport to try.
    #[error("cannot push: {0}")]
    PublishFailure(String),
    /// The push failed on both transports, the remote URL was restored.
    #[error("cannot push with either {original} or {alternate}: {output}")]
    PublishFallbackFailure {
        original: Transport,
        alternate: Transport,
        output: String,
    },
}

/// The remote URLs during one publish attempt.
struct RemoteState {
    original_url: String,
    current_url: String,
}

/// The pipeline that stages, commits and pushes one saved file.
///
/// The steps are run strictly after each other, every step waits on its command.
/// If the push fails, the remote is switched between HTTPS and SSH and the push is
/// retried once. If that fails too, the remote is restored to the original URL.
pub struct GitPipeline {
    runner: Arc<dyn CommandRunner>,
    push_after_noop_commit: bool,
}

impl GitPipeline {
    /// Creates a new pipeline, that doesn't push if there was nothing to commit.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        GitPipeline {
            runner,
            push_after_noop_commit: false,
        }
    }

    /// Push even if there was nothing to commit, to publish earlier unpushed commits.
    pub fn push_after_noop_commit(mut self, push_after_noop_commit: bool) -> Self {
        self.push_after_noop_commit = push_after_noop_commit;
        self
    }

    /// Run the pipeline to the end for the request.
    pub fn run(&self, request: &SaveRequest) -> Result<PipelineOutcome, PipelineError> {
        self.stage(request)?;

        let committed = self.commit(request)?;
        if !committed && !self.push_after_noop_commit {
            debug!("Nothing to commit in {}, not pushing.", request.display_name);
            return Ok(PipelineOutcome::NothingToCommit);
        }

        self.publish(request)
    }

    fn exec(&self, request: &SaveRequest, args: &[&str]) -> Result<CommandOutput, RunnerError> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.runner.run(&args, &request.working_directory)
    }

    fn stage(&self, request: &SaveRequest) -> Result<(), PipelineError> {
        debug!("Staging {}.", request.path);
        let output = self
            .exec(request, &["add", request.path.as_str()])
            .map_err(|err| PipelineError::StageFailure(err.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            Err(PipelineError::StageFailure(output.output))
        }
    }

    /// Commit the index, returns false if there was nothing to commit.
    fn commit(&self, request: &SaveRequest) -> Result<bool, PipelineError> {
        debug!("Committing {} as {:?}.", request.display_name, request.timestamp);
        let output = self
            .exec(request, &["commit", "-m", request.timestamp.as_str()])
            .map_err(|err| PipelineError::CommitFailure(err.to_string()))?;

        if output.success() {
            Ok(true)
        } else if is_nothing_to_commit(&output.output) || is_up_to_date(&output.output) {
            Ok(false)
        } else {
            Err(PipelineError::CommitFailure(output.output))
        }
    }

    fn push(&self, request: &SaveRequest) -> Result<CommandOutput, RunnerError> {
        debug!("Pushing {}.", request.display_name);
        self.exec(request, &["push"])
    }

    fn publish(&self, request: &SaveRequest) -> Result<PipelineOutcome, PipelineError> {
        let output = self
            .push(request)
            .map_err(|err| PipelineError::PublishFailure(err.to_string()))?;

        if output.success() || is_up_to_date(&output.output) {
            Ok(PipelineOutcome::Pushed)
        } else {
            warn!("Push failed, trying the other transport: {}", output.output);
            self.publish_with_fallback(request, output.output)
        }
    }

    fn publish_with_fallback(
        &self,
        request: &SaveRequest,
        push_error: String,
    ) -> Result<PipelineOutcome, PipelineError> {
        let output = self
            .exec(request, &["remote", "get-url", "origin"])
            .map_err(|err| PipelineError::RemoteFetchFailure(err.to_string()))?;
        if !output.success() {
            return Err(PipelineError::RemoteFetchFailure(output.output));
        }

        let original_url = output.output.trim().to_string();
        let Some(current_url) = to_alternate(&original_url) else {
            debug!("Remote {original_url} has no other transport.");
            return Err(PipelineError::PublishFailure(push_error));
        };
        let remote = RemoteState {
            original_url,
            current_url,
        };

        self.set_url(request, &remote.current_url)?;

        let retry = self.push(request);
        match retry {
            Ok(output) if output.success() || is_up_to_date(&output.output) => {
                info!(
                    "Pushed over {}, the remote now points to {}.",
                    Transport::of(&remote.current_url),
                    remote.current_url
                );
                Ok(PipelineOutcome::PushedWithFallback(remote.current_url))
            }
            retry => {
                let output = match retry {
                    Ok(output) => output.output,
                    Err(err) => err.to_string(),
                };
                if let Err(err) = self.set_url(request, &remote.original_url) {
                    warn!("Failed restoring the remote to {}: {err}.", remote.original_url);
                }

                Err(PipelineError::PublishFallbackFailure {
                    original: Transport::of(&remote.original_url),
                    alternate: Transport::of(&remote.current_url),
                    output,
                })
            }
        }
    }

    fn set_url(&self, request: &SaveRequest, url: &str) -> Result<(), PipelineError> {
        debug!("Setting remote origin to {url}.");
        let output = self
            .exec(request, &["remote", "set-url", "origin", url])
            .map_err(|err| PipelineError::SetUrlFailure(err.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            Err(PipelineError::SetUrlFailure(output.output))
        }
    }
}

fn contains_any(output: &str, phrases: &[&str]) -> bool {
    let output = output.to_lowercase();
    phrases.iter().any(|phrase| output.contains(phrase))
}

fn is_nothing_to_commit(output: &str) -> bool {
    contains_any(output, NOTHING_TO_COMMIT_PHRASES)
}

fn is_up_to_date(output: &str) -> bool {
    contains_any(output, UP_TO_DATE_PHRASES)
}
