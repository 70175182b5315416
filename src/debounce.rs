use crate::request::SaveTrigger;
use log::{debug, error, trace};
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};
use thiserror::Error;

/// A custom error describing the error cases for the DebounceScheduler.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// The timer thread cannot be started.
    #[error("cannot start the debounce timer: {0}")]
    FailedStart(#[from] std::io::Error),
    /// Cannot send to the timer thread. This usually means that it stopped.
    #[error("cannot notify the debounce timer, it stopped")]
    Stopped(#[from] SendError<SaveTrigger>),
}

/// A scheduler that collapses bursts of triggers into one admission.
///
/// There is a single timer shared by every file: a trigger while the timer is
/// running restarts it and replaces the previous trigger, even for another file.
/// When the delay passes without a new trigger, the last one is admitted.
/// With zero delay every trigger is admitted immediately.
pub struct DebounceScheduler {
    tx: Sender<SaveTrigger>,
    handle: JoinHandle<()>,
}

impl DebounceScheduler {
    /// Start the timer thread, that calls `admit` with the surviving triggers.
    pub fn new<F>(delay: Duration, admit: F) -> Result<Self, DebounceError>
    where
        F: Fn(SaveTrigger) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<SaveTrigger>();
        let handle = thread::Builder::new()
            .name(String::from("gsave-debounce"))
            .spawn(move || Self::listen(delay, rx, admit))?;

        Ok(DebounceScheduler { tx, handle })
    }

    fn listen<F>(delay: Duration, rx: Receiver<SaveTrigger>, admit: F)
    where
        F: Fn(SaveTrigger),
    {
        while let Ok(mut trigger) = rx.recv() {
            if !delay.is_zero() {
                loop {
                    match rx.recv_timeout(delay) {
                        Ok(next) => {
                            trace!(
                                "Trigger for {} replaced {} in the debounce window.",
                                next.display_name,
                                trigger.display_name
                            );
                            trigger = next;
                        }
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            debug!("Admitting {} before stopping.", trigger.display_name);
                            break;
                        }
                    }
                }
            }

            admit(trigger);
        }
    }

    /// Record a trigger, restarting the timer.
    pub fn notify(&self, trigger: SaveTrigger) -> Result<(), DebounceError> {
        self.tx.send(trigger)?;
        Ok(())
    }

    /// Stop the timer thread. A trigger that is still waiting is admitted immediately.
    pub fn shutdown(self) {
        let DebounceScheduler { tx, handle } = self;
        drop(tx);
        if handle.join().is_err() {
            error!("The debounce timer stopped unexpectedly.");
        }
    }
}
