//! Activity execution and recovery.
//!
//! - [`recovery`] - Reconcile persisted progress with the step order
//! - [`executor`] - Run due steps and persist each success
//! - [`signal`] - Shared flag, order changes and progress snapshot
//! - [`liveness`] - One registered worker per activity id
//! - [`worker`] - The background poll loop and its caller handle

pub mod executor;
pub mod liveness;
pub mod recovery;
pub mod signal;
pub mod worker;

pub use executor::{ActivityEngine, BatchReport, OrderChange, SyncOutcome};
pub use liveness::{is_worker_alive, live_workers, worker_name, WorkerLease, WORKER_NAME_PREFIX};
pub use recovery::{plan_resume, restore, ResumePlan};
pub use signal::{ActivitySnapshot, Signal, Wakeup, WorkerPhase};
pub use worker::{ActivityHandle, ActivityWorker, WorkerOptions};
