//! Error types for stepwise operations.
//!
//! This module defines [`StepwiseError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration errors (empty registry, missing metadata, a persisted
//!   state the step order does not know) are fatal and never retried
//! - Step failures abort the current batch and stop the worker
//! - Persistence failures (including a corrupt table file) are fatal for
//!   the step being recorded and never count as configuration errors
//! - Use `anyhow::Error` (via `StepwiseError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stepwise operations.
#[derive(Debug, Error)]
pub enum StepwiseError {
    /// The step registry has no entries.
    #[error("Step registry is empty: an activity needs at least one step")]
    EmptyRegistry,

    /// A required activity metadata field is missing or blank.
    #[error("Missing activity metadata field: {field}")]
    MissingMetadata { field: String },

    /// A step name was placed in the order without a registered action.
    #[error("Step '{step}' has no registered action")]
    UnregisteredStep { step: String },

    /// A step name appears twice in the registry or the order.
    #[error("Step '{step}' is already present")]
    DuplicateStep { step: String },

    /// The persisted state is not part of the current step order.
    #[error("Activity '{activity_id}' is at unknown state '{state}'")]
    UnknownState { activity_id: String, state: String },

    /// A step action reported failure.
    #[error("Step '{step}' of activity '{activity_id}' failed: {message}")]
    StepFailed {
        activity_id: String,
        step: String,
        message: String,
    },

    /// The row store could not be read or written.
    #[error("Persistence failed for activity '{activity_id}': {message}")]
    Persistence {
        activity_id: String,
        message: String,
    },

    /// The activity table file could not be decoded or encoded.
    #[error("Activity table {path} is unusable: {message}")]
    StoreFailed { path: PathBuf, message: String },

    /// A write was attempted on an activity already marked finished.
    #[error("Activity '{activity_id}' is already finished")]
    ActivityFinished { activity_id: String },

    /// Another live worker already drives this activity.
    #[error("A worker for activity '{activity_id}' is already running")]
    WorkerAlreadyRunning { activity_id: String },

    /// Activity file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse an activity file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// The step order changed in a way other than appending.
    #[error("Step order diverged: {message}")]
    OrderDiverged { message: String },

    /// Shell command could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepwiseError {
    /// Whether this error comes from a misconfigured activity rather than
    /// from running it.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StepwiseError::EmptyRegistry
                | StepwiseError::MissingMetadata { .. }
                | StepwiseError::UnregisteredStep { .. }
                | StepwiseError::DuplicateStep { .. }
                | StepwiseError::UnknownState { .. }
                | StepwiseError::OrderDiverged { .. }
                | StepwiseError::ConfigValidationError { .. }
        )
    }
}

/// Result type alias for stepwise operations.
pub type Result<T> = std::result::Result<T, StepwiseError>;
