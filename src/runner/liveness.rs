//! Registry of live workers.
//!
//! Every worker holds a [`WorkerLease`] for its whole lifetime. The lease is
//! the single in-process registration point per activity id: a second
//! worker for the same id cannot acquire one while the first is alive.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::{Result, StepwiseError};

/// Prefix of every worker thread name.
pub const WORKER_NAME_PREFIX: &str = "activity_worker_";

// activity_id -> worker name
static LIVE_WORKERS: Mutex<BTreeMap<String, String>> = Mutex::new(BTreeMap::new());

/// Thread name used for an activity's worker.
pub fn worker_name(activity_id: &str) -> String {
    format!("{}{}", WORKER_NAME_PREFIX, activity_id)
}

/// Exclusive registration of a worker for one activity id.
#[derive(Debug)]
pub struct WorkerLease {
    activity_id: String,
}

impl WorkerLease {
    /// Register a worker for `activity_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StepwiseError::WorkerAlreadyRunning`] if another lease for
    /// the same id is held.
    pub fn acquire(activity_id: &str) -> Result<Self> {
        let mut live = LIVE_WORKERS.lock().unwrap_or_else(PoisonError::into_inner);
        if live.contains_key(activity_id) {
            return Err(StepwiseError::WorkerAlreadyRunning {
                activity_id: activity_id.to_string(),
            });
        }
        live.insert(activity_id.to_string(), worker_name(activity_id));
        debug!("Registered worker for activity '{}'", activity_id);

        Ok(Self {
            activity_id: activity_id.to_string(),
        })
    }

    /// Activity this lease covers.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        LIVE_WORKERS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.activity_id);
        debug!("Released worker for activity '{}'", self.activity_id);
    }
}

/// Check if a worker for `activity_id` is alive in this process.
pub fn is_worker_alive(activity_id: &str) -> bool {
    let name = worker_name(activity_id);
    LIVE_WORKERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .any(|n| *n == name)
}

/// Names of all live workers, sorted.
pub fn live_workers() -> Vec<String> {
    let mut names: Vec<String> = LIVE_WORKERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .cloned()
        .collect();
    names.sort();
    names
}
