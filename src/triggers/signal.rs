use super::{Event, Trigger, TriggerError};
use log::debug;
use std::sync::{atomic::AtomicBool, mpsc::Sender};

/// A trigger that stops the program on a termination signal.
///
/// On the first signal no more saves are accepted, but the pending ones are
/// finished. On the second one the program exits immediately, even if a push
/// is still running.
pub struct SignalTrigger {
    stopping: AtomicBool,
}

impl SignalTrigger {
    pub fn new() -> SignalTrigger {
        SignalTrigger {
            stopping: AtomicBool::new(false),
        }
    }

    /// Handle one signal, returns the exit code if the program has to exit right now.
    #[cfg(unix)]
    fn handle_signal(&self, tx: &Sender<Option<Event>>, signal: i32) -> Option<i32> {
        use log::{error, warn};
        use std::sync::atomic::Ordering;

        if self.stopping.swap(true, Ordering::AcqRel) {
            warn!("Got signal {signal} again, exiting without finishing the saves.");
            return Some(128 + signal);
        }

        debug!("Got signal {signal}, stopping after the pending saves finished.");
        if tx.send(None).is_err() {
            error!("Failed stopping the application with signal {signal}.");
        }
        None
    }
}

impl Default for SignalTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Trigger for SignalTrigger {
    /// Starts a trigger that iterates over signals and stops the program.
    #[cfg(unix)]
    fn listen(&self, tx: Sender<Option<Event>>) -> Result<(), TriggerError> {
        use signal_hook::{
            consts::TERM_SIGNALS,
            iterator::{exfiltrator::SignalOnly, SignalsInfo},
        };
        use std::process;

        let mut signals = SignalsInfo::<SignalOnly>::new(TERM_SIGNALS).map_err(|err| {
            TriggerError::FailedTrigger(format!("cannot set up signal handlers: {err}"))
        })?;
        for signal in &mut signals {
            if let Some(code) = self.handle_signal(&tx, signal) {
                process::exit(code);
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn listen(&self, _tx: Sender<Option<Event>>) -> Result<(), TriggerError> {
        debug!("Signal handlers are not supported on non-unix systems.");

        Ok(())
    }

    fn submits_saves(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn it_should_stop_on_the_first_signal() {
        let trigger = SignalTrigger::new();
        let (tx, rx) = mpsc::channel::<Option<Event>>();

        assert_eq!(None, trigger.handle_signal(&tx, 15));
        drop(tx);

        let msgs: Vec<_> = rx.iter().collect();
        assert_eq!(1, msgs.len());
        assert!(msgs[0].is_none());
    }

    #[test]
    fn it_should_exit_on_the_second_signal() {
        let trigger = SignalTrigger::new();
        let (tx, _rx) = mpsc::channel::<Option<Event>>();

        assert_eq!(None, trigger.handle_signal(&tx, 2));
        assert_eq!(Some(130), trigger.handle_signal(&tx, 2));
    }
}
