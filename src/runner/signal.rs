//! Shared signal between an activity's worker and its callers.
//!
//! One mutex guards the "new steps available" flag, queued order changes,
//! the stop request and the published progress snapshot. The worker waits
//! on one condition variable; observers wait on another. Both sides hold
//! the same `Arc<Signal>`, so every write is seen by the reader.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::executor::OrderChange;

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Created, not yet running.
    Starting,

    /// Restoring progress from the store.
    Synchronizing,

    /// Waiting for the signal.
    Idle,

    /// Running due steps.
    Executing,

    /// The terminal step completed (now or in an earlier run).
    Finished,

    /// A step, the store or the configuration failed.
    Failed,

    /// The caller asked the worker to stop.
    Stopped,
}

impl WorkerPhase {
    /// Check if this is a terminal phase (the worker has exited or is exiting).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerPhase::Finished | WorkerPhase::Failed | WorkerPhase::Stopped
        )
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerPhase::Starting => "starting",
            WorkerPhase::Synchronizing => "synchronizing",
            WorkerPhase::Idle => "idle",
            WorkerPhase::Executing => "executing",
            WorkerPhase::Finished => "finished",
            WorkerPhase::Failed => "failed",
            WorkerPhase::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Progress of one activity as last published by its worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub activity_id: String,
    pub phase: WorkerPhase,
    pub current_state: Option<String>,
    pub is_finished: bool,
    /// Steps executed by this worker (not counting earlier runs).
    pub steps_executed: usize,
}

/// Why the worker woke up.
#[derive(Debug)]
pub enum Wakeup {
    /// The poll interval elapsed without a signal.
    Timeout,

    /// The signal was raised; carries the changes queued before it.
    Raised(Vec<OrderChange>),

    /// The caller asked the worker to stop.
    Stop,
}

#[derive(Debug)]
struct SignalState {
    raised: bool,
    stop: bool,
    changes: Vec<OrderChange>,
    snapshot: ActivitySnapshot,
}

/// Synchronization point shared by a worker and its handle.
#[derive(Debug)]
pub struct Signal {
    state: Mutex<SignalState>,
    wake: Condvar,
    changed: Condvar,
}

impl Signal {
    /// Create a signal for a worker that has not started yet.
    pub fn new(activity_id: &str) -> Self {
        Self {
            state: Mutex::new(SignalState {
                raised: false,
                stop: false,
                changes: Vec::new(),
                snapshot: ActivitySnapshot {
                    activity_id: activity_id.to_string(),
                    phase: WorkerPhase::Starting,
                    current_state: None,
                    is_finished: false,
                    steps_executed: 0,
                },
            }),
            wake: Condvar::new(),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the "new steps available" flag.
    pub fn raise(&self) {
        self.lock().raised = true;
        self.wake.notify_all();
    }

    /// Queue an order change for the next raise.
    pub fn push_change(&self, change: OrderChange) {
        self.lock().changes.push(change);
    }

    /// Ask the worker to exit at its next idle check.
    pub fn request_stop(&self) {
        self.lock().stop = true;
        self.wake.notify_all();
    }

    /// Wait up to `interval` for the flag, clearing it when seen.
    pub fn wait(&self, interval: Duration) -> Wakeup {
        let guard = self.lock();
        let (mut state, _) = self
            .wake
            .wait_timeout_while(guard, interval, |s| !s.raised && !s.stop)
            .unwrap_or_else(PoisonError::into_inner);

        if state.stop {
            Wakeup::Stop
        } else if state.raised {
            state.raised = false;
            Wakeup::Raised(std::mem::take(&mut state.changes))
        } else {
            Wakeup::Timeout
        }
    }

    /// Replace the published snapshot and wake observers.
    pub fn publish(&self, snapshot: ActivitySnapshot) {
        self.lock().snapshot = snapshot;
        self.changed.notify_all();
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ActivitySnapshot {
        self.lock().snapshot.clone()
    }

    /// Block until `predicate` holds for the snapshot or `timeout` passes.
    ///
    /// Returns whether the predicate held.
    pub fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&ActivitySnapshot) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();

        loop {
            if predicate(&state.snapshot) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
