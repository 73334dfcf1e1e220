//! Activity file schema.
//!
//! This module contains the struct definitions that map to the YAML
//! activity file consumed by the `stepwise` binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::runner::WorkerOptions;

/// Root structure of an activity file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Descriptive activity name written to the row.
    pub activity_name: String,

    /// Optional correlation id written to the row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Runner settings
    pub settings: Settings,

    /// Steps in execution order; the last one finishes the activity.
    pub steps: Vec<StepConfig>,
}

/// Runner settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Row store file, relative to the activity file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,

    /// Idle poll interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

impl Settings {
    /// Worker options derived from these settings.
    pub fn worker_options(&self) -> WorkerOptions {
        self.poll_interval_ms
            .map(|ms| WorkerOptions {
                poll_interval: Duration::from_millis(ms),
            })
            .unwrap_or_default()
    }
}

/// One step of an activity file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Unique step name.
    pub name: String,

    /// Shell command; exit code 0 means success.
    pub command: String,

    /// Description (for display)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Extra environment variables for the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}
