//! Commit and push files to their git remote every time they are saved.
//!
//! ## How it works
//!
//! `gsave` is built up from **triggers**, a **debounce**, a **queue** and a **pipeline**.
//! Triggers are long running background processes that report saved files (for example
//! from the standard input or from HTTP requests). Saves are debounced, so a burst of
//! saves results in one commit. The admitted saves are queued and the pipeline runs
//! one at a time: it stages the file, commits it and pushes it. If the push fails,
//! it is retried once over the other transport (HTTPS or SSH).
//!
//! ```ignore
//! +---------+     +----------+     +-------+     +-------------------------+
//! | trigger | --> | debounce | --> | queue | --> | add -> commit -> push   |
//! +---------+     +----------+     +-------+     +-------------------------+
//! ```
//!

/// The autosaver that ties the debounce, the queue and the pipeline together.
pub mod autosave;
/// A scheduler that collapses bursts of saves into one.
pub mod debounce;
/// A notifier reports the outcome of every save.
pub mod notify;
/// The pipeline that stages, commits and pushes a saved file.
pub mod pipeline;
/// A queue that runs the pipeline for one save at a time.
pub mod queue;
/// Rewriting remote URLs between HTTPS and SSH.
pub mod remote;
/// The saves before and after admission.
pub mod request;
/// A runner executes the git commands.
pub mod runner;
/// A trigger is a long running background process, which reports saved files
/// (e.g. [from stdin](triggers::stdin::StdinTrigger) or [on HTTP request](triggers::http::HttpTrigger)).
pub mod triggers;

/// The main program loop, that routes the triggers to the autosaver.
pub mod start;
