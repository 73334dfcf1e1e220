//! Persisted activity rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityMetadata;

/// One row of the activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Descriptive name, set once.
    pub activity_name: String,

    /// Last successfully completed step.
    pub current_state: Option<String>,

    /// Whether the terminal step has completed.
    pub is_finished: bool,

    /// Caller-supplied identifier, the row key.
    pub activity_id: String,

    /// When the activity was created.
    pub activity_creation_date: DateTime<Utc>,

    /// When `current_state` last changed.
    pub current_state_creation_date: Option<DateTime<Utc>>,

    /// Opaque correlation id.
    pub external_id: Option<String>,
}

impl ActivityRecord {
    /// Row written when the first step of an activity completes.
    pub fn first_progress(
        activity_id: &str,
        metadata: &ActivityMetadata,
        update: &ProgressUpdate,
    ) -> Self {
        Self {
            activity_name: metadata.activity_name.clone(),
            current_state: Some(update.current_state.clone()),
            is_finished: update.is_finished,
            activity_id: activity_id.to_string(),
            activity_creation_date: metadata.created_at,
            current_state_creation_date: Some(update.current_state_creation_date),
            external_id: update.external_id.clone(),
        }
    }

    /// Apply a progress update in place.
    pub fn apply(&mut self, update: &ProgressUpdate) {
        self.current_state = Some(update.current_state.clone());
        self.is_finished = update.is_finished;
        self.current_state_creation_date = Some(update.current_state_creation_date);
        self.external_id = update.external_id.clone();
    }
}

/// Fields changed together after a step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub activity_id: String,
    pub current_state: String,
    pub is_finished: bool,
    pub current_state_creation_date: DateTime<Utc>,
    pub external_id: Option<String>,
}

impl ProgressUpdate {
    /// Progress stamped with the current time.
    pub fn now(activity_id: &str, step: &str, is_finished: bool, external_id: Option<String>) -> Self {
        Self {
            activity_id: activity_id.to_string(),
            current_state: step.to_string(),
            is_finished,
            current_state_creation_date: Utc::now(),
            external_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_progress_copies_metadata() {
        let meta = ActivityMetadata::new("mess_around_a_bit").with_external_id("x1");
        let update = ProgressUpdate::now("001", "read_file", false, meta.external_id.clone());
        let record = ActivityRecord::first_progress("001", &meta, &update);

        assert_eq!(record.activity_name, "mess_around_a_bit");
        assert_eq!(record.current_state.as_deref(), Some("read_file"));
        assert_eq!(record.activity_creation_date, meta.created_at);
        assert_eq!(record.external_id.as_deref(), Some("x1"));
        assert!(!record.is_finished);
    }

    #[test]
    fn apply_moves_state_and_timestamp_together() {
        let meta = ActivityMetadata::new("mess");
        let first = ProgressUpdate::now("001", "read_file", false, None);
        let mut record = ActivityRecord::first_progress("001", &meta, &first);

        let next = ProgressUpdate::now("001", "exit", true, None);
        record.apply(&next);

        assert_eq!(record.current_state.as_deref(), Some("exit"));
        assert_eq!(
            record.current_state_creation_date,
            Some(next.current_state_creation_date)
        );
        assert!(record.is_finished);
    }

    #[test]
    fn record_serializes_all_columns() {
        let meta = ActivityMetadata::new("mess");
        let update = ProgressUpdate::now("001", "read_file", false, None);
        let record = ActivityRecord::first_progress("001", &meta, &update);

        let yaml = serde_yaml::to_string(&record).unwrap();
        for column in [
            "activity_name",
            "current_state",
            "is_finished",
            "activity_id",
            "activity_creation_date",
            "current_state_creation_date",
            "external_id",
        ] {
            assert!(yaml.contains(column), "missing column {}", column);
        }
    }
}
