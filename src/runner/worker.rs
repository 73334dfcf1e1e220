//! Background worker driving one activity.
//!
//! The worker restores progress, runs whatever is due, then idles. Each
//! idle period lasts at most the poll interval; raising the signal wakes it
//! early. When woken by the signal it applies queued order changes and runs
//! the newly due steps. It exits for good when the activity finishes, a
//! step fails, or the caller asks it to stop.
//!
//! ```text
//! Starting -> Synchronizing -> Idle <-> Executing -> Finished
//!                    |                      |
//!                    +-------> Failed <-----+
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use crate::activity::ActivityDefinition;
use crate::error::{Result, StepwiseError};
use crate::state::{ActivityStore, YamlStore};
use crate::steps::{Step, StepAction};

use super::executor::{ActivityEngine, OrderChange, SyncOutcome};
use super::liveness::{worker_name, WorkerLease};
use super::signal::{ActivitySnapshot, Signal, Wakeup, WorkerPhase};

/// Tunables for a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Longest time the worker idles between signal checks.
    pub poll_interval: Duration,
}

impl WorkerOptions {
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A worker bound to one activity, ready to start.
pub struct ActivityWorker {
    store: Arc<dyn ActivityStore>,
    activity_id: String,
    definition: ActivityDefinition,
    options: WorkerOptions,
}

impl ActivityWorker {
    /// Bind a validated definition to an activity id and a store.
    ///
    /// # Errors
    ///
    /// Returns an error if `activity_id` is blank.
    pub fn new(
        store: Arc<dyn ActivityStore>,
        activity_id: impl Into<String>,
        definition: ActivityDefinition,
    ) -> Result<Self> {
        let activity_id = activity_id.into();
        if activity_id.trim().is_empty() {
            return Err(StepwiseError::MissingMetadata {
                field: "activity_id".to_string(),
            });
        }

        Ok(Self {
            store,
            activity_id,
            definition,
            options: WorkerOptions::default(),
        })
    }

    /// Bind to a YAML row store at `store_path`.
    pub fn open(
        store_path: impl Into<PathBuf>,
        activity_id: impl Into<String>,
        definition: ActivityDefinition,
    ) -> Result<Self> {
        Self::new(Arc::new(YamlStore::open(store_path)), activity_id, definition)
    }

    /// Override the default options.
    pub fn with_options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }

    /// Activity identifier.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`StepwiseError::WorkerAlreadyRunning`] if another worker in
    /// this process drives the same activity, or an IO error if the thread
    /// cannot be spawned.
    pub fn start(self) -> Result<ActivityHandle> {
        let lease = WorkerLease::acquire(&self.activity_id)?;
        let signal = Arc::new(Signal::new(&self.activity_id));
        let mut engine = ActivityEngine::new(self.store, self.activity_id.clone(), self.definition);
        let options = self.options;

        let worker_signal = Arc::clone(&signal);
        let thread = thread::Builder::new()
            .name(worker_name(&self.activity_id))
            .spawn(move || {
                let phase = run(&mut engine, &worker_signal, &options);
                // Release the id before observers can see the terminal phase.
                drop(lease);
                worker_signal.publish(snapshot(&engine, phase));
                phase
            })?;

        Ok(ActivityHandle {
            activity_id: self.activity_id,
            signal,
            thread: Some(thread),
        })
    }
}

fn snapshot(engine: &ActivityEngine, phase: WorkerPhase) -> ActivitySnapshot {
    ActivitySnapshot {
        activity_id: engine.activity_id().to_string(),
        phase,
        current_state: engine.current_state().map(String::from),
        is_finished: engine.is_finished(),
        steps_executed: engine.steps_executed(),
    }
}

/// The poll loop. Returns the terminal phase without publishing it.
fn run(engine: &mut ActivityEngine, signal: &Signal, options: &WorkerOptions) -> WorkerPhase {
    signal.publish(snapshot(engine, WorkerPhase::Synchronizing));

    match engine.synchronize() {
        Ok(SyncOutcome::AlreadyFinished) => return WorkerPhase::Finished,
        Ok(SyncOutcome::Ready) => {}
        Err(e) => {
            error!(
                activity_id = %engine.activity_id(),
                configuration = e.is_configuration(),
                "Worker cannot resume the activity: {}", e
            );
            return WorkerPhase::Failed;
        }
    }

    if !engine.due_steps().is_empty() && !execute(engine, signal) {
        return WorkerPhase::Failed;
    }

    loop {
        if engine.is_finished() {
            info!("Activity '{}' worker is finished", engine.activity_id());
            return WorkerPhase::Finished;
        }

        signal.publish(snapshot(engine, WorkerPhase::Idle));

        match signal.wait(options.poll_interval) {
            Wakeup::Timeout => continue,
            Wakeup::Stop => {
                info!("Activity '{}' worker stopped on request", engine.activity_id());
                return WorkerPhase::Stopped;
            }
            Wakeup::Raised(changes) => {
                signal.publish(snapshot(engine, WorkerPhase::Executing));

                for change in changes {
                    if let Err(e) = engine.apply(change) {
                        error!(
                            activity_id = %engine.activity_id(),
                            configuration = e.is_configuration(),
                            "Rejected step order change: {}", e
                        );
                        return WorkerPhase::Failed;
                    }
                }

                if !execute(engine, signal) {
                    return WorkerPhase::Failed;
                }
            }
        }
    }
}

/// Run one batch, publishing progress after every persisted step. Returns
/// false on failure.
fn execute(engine: &mut ActivityEngine, signal: &Signal) -> bool {
    signal.publish(snapshot(engine, WorkerPhase::Executing));
    // The engine logs failures with step detail.
    engine
        .execute_due_with(|engine| signal.publish(snapshot(engine, WorkerPhase::Executing)))
        .is_ok()
}

/// Caller-side handle to a running worker.
///
/// Dropping the handle does not stop the worker.
#[derive(Debug)]
pub struct ActivityHandle {
    activity_id: String,
    signal: Arc<Signal>,
    thread: Option<JoinHandle<WorkerPhase>>,
}

impl ActivityHandle {
    /// Activity identifier.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Raise the "new steps available" signal.
    pub fn notify(&self) {
        self.signal.raise();
    }

    /// Release an already registered step at the end of the order.
    ///
    /// Takes effect at the next [`notify`](Self::notify).
    pub fn append_step(&self, name: impl Into<String>) {
        self.signal.push_change(OrderChange::Append(name.into()));
    }

    /// Register a new closure step and release it at the end of the order.
    ///
    /// Takes effect at the next [`notify`](Self::notify).
    pub fn register_step<F>(&self, name: impl Into<String>, action: F)
    where
        F: FnMut() -> anyhow::Result<bool> + Send + 'static,
    {
        self.signal
            .push_change(OrderChange::Register(Step::new(name, action)));
    }

    /// Register a new [`StepAction`] and release it at the end of the order.
    pub fn register_action(&self, name: impl Into<String>, action: impl StepAction + 'static) {
        self.signal
            .push_change(OrderChange::Register(Step::with_action(name, action)));
    }

    /// Ask the worker to exit at its next idle check.
    pub fn stop(&self) {
        self.signal.request_stop();
    }

    /// Latest published progress.
    pub fn snapshot(&self) -> ActivitySnapshot {
        self.signal.snapshot()
    }

    /// Last completed step.
    pub fn current_state(&self) -> Option<String> {
        self.snapshot().current_state
    }

    /// Whether the terminal step has completed.
    pub fn is_finished(&self) -> bool {
        self.snapshot().is_finished
    }

    /// Current worker phase.
    pub fn phase(&self) -> WorkerPhase {
        self.snapshot().phase
    }

    /// Whether the worker thread is still running.
    pub fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Block until `predicate` holds or `timeout` passes. Returns whether it held.
    pub fn wait_until<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: FnMut(&ActivitySnapshot) -> bool,
    {
        self.signal.wait_until(timeout, predicate)
    }

    /// Wait for the worker to exit and return its terminal phase.
    pub fn join(mut self) -> WorkerPhase {
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or(WorkerPhase::Failed),
            None => self.phase(),
        }
    }
}
