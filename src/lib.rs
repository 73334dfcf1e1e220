//! Stepwise - Resumable, step-by-step activities.
//!
//! An activity advances through an ordered sequence of named steps. After
//! every successful step its progress is written to a row store, so a worker
//! restarted after a crash resumes right after the last completed step. A
//! background worker per activity runs due steps, then idles until it is
//! signalled that more steps were appended.
//!
//! # Modules
//!
//! - [`activity`] - Activity metadata and validated definitions
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Activity files for the binary
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Recovery, step execution and the background worker
//! - [`shell`] - Shell command execution for command-backed steps
//! - [`state`] - Persisted activity rows and their stores
//! - [`steps`] - Step actions, the registry and the step order
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stepwise::activity::{ActivityDefinition, ActivityMetadata};
//! use stepwise::runner::{ActivityWorker, WorkerPhase};
//! use stepwise::state::{ActivityStore, MemoryStore};
//! use stepwise::steps::StepRegistry;
//!
//! let registry = StepRegistry::builder()
//!     .step("read_file", || Ok(true))
//!     .step("exit", || Ok(true))
//!     .build()
//!     .unwrap();
//! let definition =
//!     ActivityDefinition::new(ActivityMetadata::new("mess_around_a_bit"), registry).unwrap();
//!
//! let store = Arc::new(MemoryStore::new());
//! let handle = ActivityWorker::new(store.clone(), "doc-example", definition)
//!     .unwrap()
//!     .start()
//!     .unwrap();
//!
//! assert_eq!(handle.join(), WorkerPhase::Finished);
//! assert!(store.fetch("doc-example").unwrap().unwrap().is_finished);
//! ```

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod state;
pub mod steps;

pub use error::{Result, StepwiseError};
