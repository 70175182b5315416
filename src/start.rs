use crate::{
    autosave::Autosaver,
    debounce::DebounceError,
    triggers::{Event, Trigger},
};
use log::{debug, error};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc,
    },
    thread,
};
use thiserror::Error;

/// A custom error implementation for the start function
#[derive(Debug, Error)]
pub enum StartError {
    #[error("You have to define at least one trigger.")]
    NoTriggers,
    #[error("Saving stopped: {0}.")]
    StoppedSaving(#[from] DebounceError),
}

/// The main program loop, that routes the trigger events to the autosaver,
/// until a trigger stops it. The pending saves are finished before returning.
pub fn start(triggers: Vec<Box<dyn Trigger>>, autosaver: Autosaver) -> Result<(), StartError> {
    let (tx, rx) = mpsc::channel::<Option<Event>>();

    if triggers.is_empty() {
        return Err(StartError::NoTriggers);
    }

    let running = Arc::new(AtomicUsize::new(
        triggers.iter().filter(|trigger| trigger.submits_saves()).count(),
    ));
    for trigger in triggers {
        let tx = tx.clone();
        let running = running.clone();
        thread::spawn(move || {
            let result = trigger.listen(tx.clone());
            if let Err(err) = result {
                error!("Trigger failed: {err}.");
            }
            if trigger.submits_saves() && running.fetch_sub(1, Ordering::SeqCst) == 1 {
                debug!("Every trigger finished, nothing can be saved anymore.");
                let _ = tx.send(None);
            }
        });
    }
    drop(tx);

    debug!("Waiting on triggers.");
    let mut result = Ok(());
    while let Ok(Some(event)) = rx.recv() {
        match event {
            Event::Save(trigger) => {
                if let Err(err) = autosaver.submit_trigger(trigger) {
                    result = Err(err.into());
                    break;
                }
            }
            Event::Enable => autosaver.set_enabled(true),
            Event::Disable => autosaver.set_enabled(false),
            Event::Status(reply) => {
                if reply.send(autosaver.status()).is_err() {
                    debug!("Status was requested, but nobody waited for it.");
                }
            }
        }
    }

    debug!("Finished listening, finishing the pending saves.");
    autosaver.shutdown();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        autosave::AutosaveConfig,
        notify::test::TestNotifier,
        request::SaveTrigger,
        runner::test::TestRunner,
        triggers::{MockTrigger, TriggerError},
    };
    use std::{
        thread::sleep,
        time::{Duration, Instant},
    };

    fn autosaver() -> (Autosaver, Arc<TestRunner>, Arc<TestNotifier>) {
        let runner = Arc::new(TestRunner::new());
        let notifier = Arc::new(TestNotifier::default());
        let autosaver = Autosaver::new(
            AutosaveConfig {
                debounce: Duration::from_millis(50),
                ..AutosaveConfig::default()
            },
            runner.clone(),
            notifier.clone(),
        )
        .unwrap();

        (autosaver, runner, notifier)
    }

    fn save(path: &str) -> Option<Event> {
        Some(Event::Save(SaveTrigger::from_path(path).unwrap()))
    }

    #[test]
    fn it_should_save_and_stop() {
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_submits_saves().return_const(true);
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(save("/notes/notes.md"))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];
        let (autosaver, runner, notifier) = autosaver();

        let result = start(triggers, autosaver);
        assert!(result.is_ok());

        assert_eq!(vec!["add /notes/notes.md"], runner.calls_of("add"));
        assert_eq!(vec![(String::from("/notes/notes.md"), None)], notifier.outcomes());
    }

    #[test]
    fn it_should_not_save_while_disabled() {
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_submits_saves().return_const(true);
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(Event::Disable))?;
            tx.send(save("/notes/a.md"))?;
            tx.send(Some(Event::Enable))?;
            tx.send(save("/notes/b.md"))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];
        let (autosaver, runner, _notifier) = autosaver();

        let result = start(triggers, autosaver);
        assert!(result.is_ok());

        assert_eq!(vec!["add /notes/b.md"], runner.calls_of("add"));
    }

    #[test]
    fn it_should_answer_the_status() {
        let (status_tx, status_rx) = mpsc::channel();
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_submits_saves().return_const(true);
        mock_trigger.expect_listen().returning(move |tx| {
            tx.send(Some(Event::Status(status_tx.clone())))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];
        let (autosaver, _runner, _notifier) = autosaver();

        let result = start(triggers, autosaver);
        assert!(result.is_ok());

        let status = status_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(status.enabled);
        assert_eq!(0, status.pending);
        assert!(!status.active);
    }

    #[test]
    fn it_should_stop_if_every_trigger_finished() {
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_submits_saves().return_const(true);
        mock_trigger
            .expect_listen()
            .returning(|_| Err(TriggerError::Misconfigured(String::from("Testing purposes."))));
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];
        let (autosaver, runner, _notifier) = autosaver();

        let result = start(triggers, autosaver);
        assert!(result.is_ok());

        assert!(runner.calls().is_empty());
    }

    #[test]
    fn it_should_fail_without_triggers() {
        let triggers: Vec<Box<dyn Trigger>> = vec![];
        let (autosaver, _runner, _notifier) = autosaver();

        let result = start(triggers, autosaver);
        assert!(
            matches!(result, Err(StartError::NoTriggers)),
            "{result:?} should be NoTriggers"
        );
    }

    #[test]
    fn it_should_stop_if_only_the_signal_trigger_is_left() {
        let mut failing_trigger = MockTrigger::new();
        failing_trigger.expect_submits_saves().return_const(true);
        failing_trigger
            .expect_listen()
            .returning(|_| Err(TriggerError::Misconfigured(String::from("Testing purposes."))));
        let mut waiting_trigger = MockTrigger::new();
        waiting_trigger.expect_submits_saves().return_const(false);
        waiting_trigger.expect_listen().returning(|tx| {
            sleep(Duration::from_secs(3));
            drop(tx);
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> =
            vec![Box::new(failing_trigger), Box::new(waiting_trigger)];
        let (autosaver, _runner, _notifier) = autosaver();

        let started = Instant::now();
        let result = start(triggers, autosaver);
        assert!(result.is_ok());

        assert!(
            started.elapsed() < Duration::from_secs(2),
            "should stop without waiting for the other trigger"
        );
    }
}
