//! Step execution engine.
//!
//! [`ActivityEngine`] owns one activity's registry, order and cursor. It runs
//! due steps one at a time and records each success in the store before the
//! next step starts. The first failure aborts the batch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::activity::{ActivityDefinition, ActivityMetadata};
use crate::error::{Result, StepwiseError};
use crate::state::{ActivityRecord, ActivityStore, ProgressUpdate};
use crate::steps::{Step, StepOrder, StepRegistry};

use super::recovery::{self, ResumePlan};

/// A change to the step order requested while the worker runs.
#[derive(Debug)]
pub enum OrderChange {
    /// Release an already registered step.
    Append(String),

    /// Register a new step and release it.
    Register(Step),
}

/// Outcome of synchronizing with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The activity finished in an earlier run.
    AlreadyFinished,

    /// Progress restored; due steps may be executed.
    Ready,
}

/// Steps completed by one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Names of the steps executed and persisted, in order.
    pub executed: Vec<String>,

    /// Whether the activity finished during the batch.
    pub finished: bool,
}

/// Drives a single activity through its due steps.
pub struct ActivityEngine {
    store: Arc<dyn ActivityStore>,
    activity_id: String,
    metadata: ActivityMetadata,
    registry: StepRegistry,
    order: StepOrder,
    cursor: usize,
    current_state: Option<String>,
    is_finished: bool,
    external_id: Option<String>,
    row_exists: bool,
    steps_executed: usize,
}

impl ActivityEngine {
    /// Create an engine for `activity_id`. No store access happens here.
    pub fn new(
        store: Arc<dyn ActivityStore>,
        activity_id: impl Into<String>,
        definition: ActivityDefinition,
    ) -> Self {
        let (metadata, registry, order) = definition.into_parts();
        let external_id = metadata.external_id.clone();
        Self {
            store,
            activity_id: activity_id.into(),
            metadata,
            registry,
            order,
            cursor: 0,
            current_state: None,
            is_finished: false,
            external_id,
            row_exists: false,
            steps_executed: 0,
        }
    }

    /// Restore progress from the store.
    pub fn synchronize(&mut self) -> Result<SyncOutcome> {
        let plan = recovery::restore(self.store.as_ref(), &self.activity_id, &self.order)
            .inspect_err(|e| {
                error!(
                    activity_id = %self.activity_id,
                    "Failed to synchronize activity: {}", e
                )
            })?;

        self.cursor = plan.cursor();
        if let Some(record) = plan.record() {
            self.row_exists = true;
            self.current_state = record.current_state.clone();
            self.is_finished = record.is_finished;
            if self.external_id.is_none() {
                self.external_id = record.external_id.clone();
            }
        }

        match plan {
            ResumePlan::Finished(_) => Ok(SyncOutcome::AlreadyFinished),
            ResumePlan::Fresh | ResumePlan::Resume { .. } => Ok(SyncOutcome::Ready),
        }
    }

    /// Apply a requested order change.
    ///
    /// The order always stays a prefix of the registry: an appended name
    /// must be the next registered step, and a new step can only be
    /// registered once every existing step is released.
    ///
    /// # Errors
    ///
    /// Appending an unregistered or already released name, releasing a step
    /// out of registry order, or registering a name twice is a
    /// configuration error.
    pub fn apply(&mut self, change: OrderChange) -> Result<()> {
        let name = match change {
            OrderChange::Append(name) => {
                if !self.registry.contains(&name) {
                    return Err(StepwiseError::UnregisteredStep { step: name });
                }
                if self.order.position(&name).is_some() {
                    return Err(StepwiseError::DuplicateStep { step: name });
                }
                let next = self.registry.names().nth(self.order.len());
                if next != Some(name.as_str()) {
                    return Err(StepwiseError::OrderDiverged {
                        message: format!(
                            "step '{}' released out of registry order, next step is '{}'",
                            name,
                            next.unwrap_or_default()
                        ),
                    });
                }
                name
            }
            OrderChange::Register(step) => {
                let name = step.name().to_string();
                if self.order.position(&name).is_some() {
                    return Err(StepwiseError::DuplicateStep { step: name });
                }
                if self.order.len() < self.registry.len() {
                    return Err(StepwiseError::OrderDiverged {
                        message: format!(
                            "step '{}' registered while {} registered step(s) are unreleased",
                            name,
                            self.registry.len() - self.order.len()
                        ),
                    });
                }
                self.registry.register(step)?;
                name
            }
        };

        let position = self.order.append(name)?;
        debug!(
            activity_id = %self.activity_id,
            "Step '{}' released at position {}",
            self.order.get(position).unwrap_or_default(),
            position
        );
        Ok(())
    }

    /// Steps released but not yet completed.
    pub fn due_steps(&self) -> &[String] {
        if self.is_finished {
            return &[];
        }
        self.order.due_from(self.cursor)
    }

    /// Execute every due step in order.
    ///
    /// Stops at the first failure and returns it; steps already persisted in
    /// this batch stay persisted.
    pub fn execute_due(&mut self) -> Result<BatchReport> {
        self.execute_due_with(|_| {})
    }

    /// Like [`execute_due`](Self::execute_due), calling `on_step` after each
    /// step is persisted.
    pub fn execute_due_with<F>(&mut self, mut on_step: F) -> Result<BatchReport>
    where
        F: FnMut(&ActivityEngine),
    {
        let due: Vec<String> = self.due_steps().to_vec();
        let mut report = BatchReport::default();

        if due.is_empty() {
            debug!(activity_id = %self.activity_id, "No due steps");
            return Ok(report);
        }

        for name in due {
            self.execute_step(&name)?;
            on_step(self);
            report.executed.push(name);

            if self.is_finished {
                break;
            }
        }

        report.finished = self.is_finished;
        Ok(report)
    }

    fn execute_step(&mut self, name: &str) -> Result<()> {
        debug!(activity_id = %self.activity_id, step = name, "Executing step");

        let step = self
            .registry
            .get_mut(name)
            .ok_or_else(|| StepwiseError::UnregisteredStep {
                step: name.to_string(),
            })?;

        let outcome = step.invoke();
        if let Some(message) = outcome.failure_message() {
            error!(
                activity_id = %self.activity_id,
                step = name,
                "Error while executing step: {}. The worker will stop.",
                message
            );
            return Err(StepwiseError::StepFailed {
                activity_id: self.activity_id.clone(),
                step: name.to_string(),
                message,
            });
        }

        let finished = self.registry.is_terminal(name);
        self.persist(name, finished).inspect_err(|e| {
            error!(
                activity_id = %self.activity_id,
                step = name,
                "Failed to save progress: {}", e
            )
        })?;

        self.cursor += 1;
        self.current_state = Some(name.to_string());
        self.is_finished = finished;
        self.steps_executed += 1;

        if finished {
            info!(activity_id = %self.activity_id, "Activity finished at step '{}'", name);
        }
        Ok(())
    }

    fn persist(&mut self, name: &str, finished: bool) -> Result<()> {
        debug!(activity_id = %self.activity_id, step = name, "Saving activity state");

        let update = ProgressUpdate::now(&self.activity_id, name, finished, self.external_id.clone());

        if !self.row_exists {
            let record = ActivityRecord::first_progress(&self.activity_id, &self.metadata, &update);
            let inserted = self.store.insert(&record)?;
            self.row_exists = true;
            if inserted {
                return Ok(());
            }
        }

        self.store.update(&update)
    }

    /// Activity identifier.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Last completed step.
    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    /// Whether the terminal step has completed.
    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// Count of completed positions in the order.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Released step order.
    pub fn order(&self) -> &StepOrder {
        &self.order
    }

    /// Steps executed by this engine since it was created.
    pub fn steps_executed(&self) -> usize {
        self.steps_executed
    }
}
