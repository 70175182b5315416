use crate::{
    notify::Notifier,
    pipeline::{GitPipeline, PipelineError, PipelineOutcome},
    request::SaveRequest,
};
use log::{debug, error};
use std::{
    any::Any,
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
    io,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

/// Starts the job of a request in the background.
type SpawnJob = dyn Fn(SaveQueue, SaveRequest) -> io::Result<()> + Send + Sync;

fn spawn_job(queue: SaveQueue, request: SaveRequest) -> io::Result<()> {
    thread::Builder::new()
        .name(String::from("gsave-job"))
        .spawn(move || queue.run_job(request))?;

    Ok(())
}

struct QueueState {
    /// The latest request for every path, ordered by path.
    pending: BTreeMap<String, SaveRequest>,
    /// The request that the pipeline is working on.
    active: Option<SaveRequest>,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    idle: Condvar,
    pipeline: GitPipeline,
    notifier: Arc<dyn Notifier>,
    spawn: Box<SpawnJob>,
}

/// A queue that runs the pipeline for one request at a time.
///
/// Requests are pending until the pipeline is free, a newer request for the same
/// path replaces the pending one. When a job finishes, the pending request with the
/// smallest path is started next. Every job runs on its own thread, so enqueueing
/// never waits on git. The queue can be cloned, the clones share the same state.
#[derive(Clone)]
pub struct SaveQueue {
    inner: Arc<QueueInner>,
}

impl SaveQueue {
    pub fn new(pipeline: GitPipeline, notifier: Arc<dyn Notifier>) -> Self {
        SaveQueue::with_spawn(pipeline, notifier, Box::new(spawn_job))
    }

    fn with_spawn(
        pipeline: GitPipeline,
        notifier: Arc<dyn Notifier>,
        spawn: Box<SpawnJob>,
    ) -> Self {
        SaveQueue {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    pending: BTreeMap::new(),
                    active: None,
                }),
                idle: Condvar::new(),
                pipeline,
                notifier,
                spawn,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add the request to the pending ones and start it if the pipeline is free.
    pub fn enqueue(&self, request: SaveRequest) {
        let mut state = self.lock();
        if let Some(previous) = state.pending.insert(request.path.clone(), request) {
            debug!(
                "Replacing the pending save of {} from {}.",
                previous.display_name, previous.timestamp
            );
        }
        self.advance_locked(state);
    }

    /// Start the next pending request, if there is no active one.
    pub fn advance(&self) {
        self.advance_locked(self.lock());
    }

    fn advance_locked<'a>(&'a self, mut state: MutexGuard<'a, QueueState>) {
        loop {
            if state.active.is_some() {
                return;
            }
            let Some((_, request)) = state.pending.pop_first() else {
                self.inner.idle.notify_all();
                return;
            };

            state.active = Some(request.clone());
            let Err(err) = (self.inner.spawn)(self.clone(), request.clone()) else {
                return;
            };

            // The request cannot be saved, report it and move on to the next one.
            error!("Cannot start saving {}: {err}.", request.display_name);
            state.active = None;
            drop(state);
            self.inner
                .notifier
                .on_error(&request, &format!("cannot start the job: {err}"));
            state = self.lock();
        }
    }

    fn run_job(&self, request: SaveRequest) {
        debug!("Saving {}.", request.display_name);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.inner.pipeline.run(&request)));
        self.on_job_complete(&request, result);
    }

    fn on_job_complete(
        &self,
        request: &SaveRequest,
        result: Result<Result<PipelineOutcome, PipelineError>, Box<dyn Any + Send>>,
    ) {
        match result {
            Ok(Ok(outcome)) => {
                debug!("Finished saving {}: {outcome:?}.", request.display_name);
                self.inner.notifier.on_success(request);
            }
            Ok(Err(err)) => self.inner.notifier.on_error(request, &err.to_string()),
            Err(_) => self
                .inner
                .notifier
                .on_error(request, "the pipeline stopped unexpectedly"),
        }

        let mut state = self.lock();
        state.active = None;
        self.advance_locked(state);
    }

    /// The requests waiting for the pipeline, ordered by path.
    pub fn pending(&self) -> Vec<SaveRequest> {
        self.lock().pending.values().cloned().collect()
    }

    /// The request that the pipeline is working on.
    pub fn active(&self) -> Option<SaveRequest> {
        self.lock().active.clone()
    }

    /// The number of pending requests and whether there is an active one.
    pub fn status(&self) -> (usize, bool) {
        let state = self.lock();
        (state.pending.len(), state.active.is_some())
    }

    /// Block until every pending request has finished.
    pub fn wait_until_idle(&self) {
        let state = self.lock();
        let _state = self
            .inner
            .idle
            .wait_while(state, |state| !state.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until every pending request has finished or the timeout passed.
    /// Returns true if the queue is idle.
    pub fn wait_until_idle_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .inner
            .idle
            .wait_timeout_while(state, timeout, |state| !state.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        state.is_idle()
    }
}
