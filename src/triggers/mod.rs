use crate::{autosave::AutosaveStatus, request::SaveTrigger};
use mockall::automock;
use std::sync::mpsc::{SendError, Sender};
use thiserror::Error;

/// A trigger that accepts saves and commands over HTTP.
pub mod http;
/// A trigger that stops the program on a signal.
pub mod signal;
/// A trigger that reads saved file paths from the standard input.
pub mod stdin;

/// An event sent from a trigger to the main loop.
#[derive(Debug)]
pub enum Event {
    /// A file was saved.
    Save(SaveTrigger),
    /// Start accepting saves.
    Enable,
    /// Stop accepting saves.
    Disable,
    /// Ask for the status, the answer is sent back on the channel.
    Status(Sender<AutosaveStatus>),
}

/// A custom error for describing the error cases for triggers
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Cannot initialize trigger, because it has a misconfiguration.
    #[error("not configured correctly: {0}")]
    Misconfigured(String),
    /// Cannot send trigger with Sender. This usually because the receiver is dropped.
    #[error("cannot send the event, receiver hang up")]
    ReceiverHangup(#[from] SendError<Option<Event>>),
    /// Running the trigger failed.
    #[error("{0}")]
    FailedTrigger(String),
}

/// A trigger is a long running background process, which sends the events
/// to the main loop. Sending `None` stops the program.
///
/// Triggers may include:
///   - the standard input ([stdin::StdinTrigger])
///   - HTTP servers ([http::HttpTrigger])
///   - termination signals ([signal::SignalTrigger])
#[automock]
pub trait Trigger: Sync + Send {
    /// Start the trigger process.
    fn listen(&self, tx: Sender<Option<Event>>) -> Result<(), TriggerError>;

    /// Whether the trigger submits saves. The program stops when every trigger
    /// that submits saves has finished.
    fn submits_saves(&self) -> bool {
        true
    }
}
