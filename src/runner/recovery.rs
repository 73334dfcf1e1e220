//! Recovery of persisted progress.
//!
//! On start a worker reconciles the persisted row with the current step
//! order. The result is a [`ResumePlan`]: either the activity already
//! finished, or a cursor into the order after which every step is due.

use tracing::{info, warn};

use crate::error::{Result, StepwiseError};
use crate::state::{ActivityRecord, ActivityStore};
use crate::steps::StepOrder;

/// What a worker should do after reading the persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumePlan {
    /// No row exists; every step in the order is due.
    Fresh,

    /// The row is finished; nothing may run and nothing may be written.
    Finished(ActivityRecord),

    /// Steps up to and including `current_state` completed earlier.
    Resume {
        record: ActivityRecord,
        /// Count of completed positions in the order.
        cursor: usize,
    },
}

impl ResumePlan {
    /// Position of the first due step.
    pub fn cursor(&self) -> usize {
        match self {
            ResumePlan::Fresh | ResumePlan::Finished(_) => 0,
            ResumePlan::Resume { cursor, .. } => *cursor,
        }
    }

    /// The persisted row, if any.
    pub fn record(&self) -> Option<&ActivityRecord> {
        match self {
            ResumePlan::Fresh => None,
            ResumePlan::Finished(record) | ResumePlan::Resume { record, .. } => Some(record),
        }
    }
}

/// Compute the resume plan for a row against the current order.
///
/// # Errors
///
/// Returns [`StepwiseError::UnknownState`] when the persisted state is not
/// part of the order. Running the whole order again would re-execute
/// completed work, so this is fatal.
pub fn plan_resume(
    activity_id: &str,
    order: &StepOrder,
    record: Option<ActivityRecord>,
) -> Result<ResumePlan> {
    let Some(record) = record else {
        return Ok(ResumePlan::Fresh);
    };

    if record.is_finished {
        return Ok(ResumePlan::Finished(record));
    }

    let cursor = match record.current_state.as_deref() {
        None => 0,
        Some(state) => match order.position(state) {
            Some(position) => position + 1,
            None => {
                return Err(StepwiseError::UnknownState {
                    activity_id: activity_id.to_string(),
                    state: state.to_string(),
                })
            }
        },
    };

    Ok(ResumePlan::Resume { record, cursor })
}

/// Read the row for `activity_id` and plan the resume.
pub fn restore(store: &dyn ActivityStore, activity_id: &str, order: &StepOrder) -> Result<ResumePlan> {
    info!("Synchronizing activity '{}'", activity_id);

    let plan = plan_resume(activity_id, order, store.fetch(activity_id)?)?;

    match &plan {
        ResumePlan::Fresh => info!("Activity '{}' has no saved progress", activity_id),
        ResumePlan::Finished(_) => {
            warn!("The activity '{}' has already been finished", activity_id)
        }
        ResumePlan::Resume { record, cursor } => info!(
            "Resuming activity '{}' after state '{}' ({} of {} steps due)",
            activity_id,
            record.current_state.as_deref().unwrap_or("-"),
            order.len().saturating_sub(*cursor),
            order.len()
        ),
    }

    Ok(plan)
}
