use crate::{
    debounce::{DebounceError, DebounceScheduler},
    notify::Notifier,
    pipeline::GitPipeline,
    queue::SaveQueue,
    request::{SaveRequest, SaveTrigger},
    runner::CommandRunner,
};
use log::{debug, info};
use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// The settings of the autosaver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// How long to wait after the last trigger before saving.
    pub debounce: Duration,
    /// Push even if there was nothing to commit.
    pub push_after_noop_commit: bool,
    /// Whether submitted saves are accepted on start.
    pub enabled: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        AutosaveConfig {
            debounce: Duration::from_secs(1),
            push_after_noop_commit: false,
            enabled: true,
        }
    }
}

/// A read-only snapshot of the autosaver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutosaveStatus {
    pub enabled: bool,
    pub pending: usize,
    pub active: bool,
}

impl Display for AutosaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} pending, {}",
            if self.enabled { "enabled" } else { "disabled" },
            self.pending,
            if self.active { "saving" } else { "idle" }
        )
    }
}

/// The autosaver debounces the submitted saves, then stages, commits and pushes them
/// one at a time.
///
/// Submitting never waits on git, the outcomes are reported to the [Notifier].
pub struct Autosaver {
    enabled: AtomicBool,
    scheduler: DebounceScheduler,
    queue: SaveQueue,
}

impl Autosaver {
    pub fn new(
        config: AutosaveConfig,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, DebounceError> {
        let pipeline =
            GitPipeline::new(runner).push_after_noop_commit(config.push_after_noop_commit);
        let queue = SaveQueue::new(pipeline, notifier);

        let admitted = queue.clone();
        let scheduler = DebounceScheduler::new(config.debounce, move |trigger| {
            let request = SaveRequest::admit(trigger);
            info!("Saving {}.", request.display_name);
            admitted.enqueue(request);
        })?;

        Ok(Autosaver {
            enabled: AtomicBool::new(config.enabled),
            scheduler,
            queue,
        })
    }

    /// Request saving the file at path in the working directory, after the debounce.
    pub fn submit(
        &self,
        path: String,
        display_name: String,
        working_directory: String,
    ) -> Result<(), DebounceError> {
        self.submit_trigger(SaveTrigger::new(path, display_name, working_directory))
    }

    pub fn submit_trigger(&self, trigger: SaveTrigger) -> Result<(), DebounceError> {
        if !self.is_enabled() {
            debug!("Autosave is disabled, ignoring {}.", trigger.display_name);
            return Ok(());
        }

        self.scheduler.notify(trigger)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enable or disable accepting new saves. Already admitted saves are finished.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!("Autosave {}.", if enabled { "enabled" } else { "disabled" });
    }

    pub fn status(&self) -> AutosaveStatus {
        let (pending, active) = self.queue.status();
        AutosaveStatus {
            enabled: self.is_enabled(),
            pending,
            active,
        }
    }

    pub fn queue(&self) -> &SaveQueue {
        &self.queue
    }

    /// Admit the waiting trigger and wait for every save to finish.
    pub fn shutdown(self) {
        let Autosaver {
            scheduler, queue, ..
        } = self;
        scheduler.shutdown();
        debug!("Waiting for the pending saves to finish.");
        queue.wait_until_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{notify::test::TestNotifier, runner::test::TestRunner};
    use std::{thread::sleep, time::Instant};

    fn autosaver(config: AutosaveConfig) -> (Autosaver, Arc<TestRunner>, Arc<TestNotifier>) {
        let runner = Arc::new(TestRunner::new());
        let notifier = Arc::new(TestNotifier::default());
        let autosaver = Autosaver::new(config, runner.clone(), notifier.clone()).unwrap();

        (autosaver, runner, notifier)
    }

    fn submit(autosaver: &Autosaver, name: &str) -> Result<(), DebounceError> {
        autosaver.submit(
            format!("/notes/{name}"),
            String::from(name),
            String::from("/notes"),
        )
    }

    #[test]
    fn it_should_save_once_for_a_burst_of_edits() -> Result<(), DebounceError> {
        let (autosaver, runner, notifier) = autosaver(AutosaveConfig {
            debounce: Duration::from_millis(100),
            ..AutosaveConfig::default()
        });

        for _ in 0..5 {
            submit(&autosaver, "notes.md")?;
        }
        sleep(Duration::from_millis(500));
        assert!(autosaver.queue().wait_until_idle_timeout(Duration::from_secs(5)));

        assert_eq!(vec!["add /notes/notes.md"], runner.calls_of("add"));
        assert_eq!(vec![(String::from("/notes/notes.md"), None)], notifier.outcomes());

        autosaver.shutdown();

        Ok(())
    }

    #[test]
    fn it_should_only_save_the_last_file_of_a_window() -> Result<(), DebounceError> {
        let (autosaver, runner, _notifier) = autosaver(AutosaveConfig {
            debounce: Duration::from_millis(100),
            ..AutosaveConfig::default()
        });

        submit(&autosaver, "a.md")?;
        submit(&autosaver, "b.md")?;
        autosaver.shutdown();

        assert_eq!(vec!["add /notes/b.md"], runner.calls_of("add"));

        Ok(())
    }

    #[test]
    fn it_should_ignore_saves_while_disabled() -> Result<(), DebounceError> {
        let (autosaver, runner, notifier) = autosaver(AutosaveConfig {
            debounce: Duration::ZERO,
            enabled: false,
            ..AutosaveConfig::default()
        });

        submit(&autosaver, "notes.md")?;
        assert!(!autosaver.status().enabled);

        autosaver.set_enabled(true);
        submit(&autosaver, "other.md")?;
        autosaver.shutdown();

        assert_eq!(vec!["add /notes/other.md"], runner.calls_of("add"));
        assert_eq!(1, notifier.outcomes().len());

        Ok(())
    }

    #[test]
    fn it_should_report_the_status() -> Result<(), DebounceError> {
        let runner = Arc::new(TestRunner::closed());
        let notifier = Arc::new(TestNotifier::default());
        let autosaver = Autosaver::new(
            AutosaveConfig {
                debounce: Duration::ZERO,
                ..AutosaveConfig::default()
            },
            runner.clone(),
            notifier,
        )?;

        assert_eq!(
            AutosaveStatus {
                enabled: true,
                pending: 0,
                active: false
            },
            autosaver.status()
        );

        submit(&autosaver, "a.md")?;
        submit(&autosaver, "b.md")?;

        // Wait until the debounce thread admitted both
        let start = Instant::now();
        while autosaver.status().pending < 1 && start.elapsed() < Duration::from_secs(5) {
            sleep(Duration::from_millis(10));
        }
        let status = autosaver.status();
        assert_eq!(
            AutosaveStatus {
                enabled: true,
                pending: 1,
                active: true
            },
            status
        );
        assert_eq!("enabled, 1 pending, saving", status.to_string());

        runner.open();
        autosaver.shutdown();

        assert_eq!(2, runner.calls_of("push").len());

        Ok(())
    }
}
