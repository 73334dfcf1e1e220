//! Row store contract and the in-memory implementation.
//!
//! The store holds one row per activity, keyed by `activity_id`. Workers
//! need point lookup, insert-if-absent and an update that replaces the
//! progress columns in a single write.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, StepwiseError};

use super::record::{ActivityRecord, ProgressUpdate};

/// Durable row store for activity progress.
pub trait ActivityStore: Send + Sync {
    /// Look up the row for an activity.
    fn fetch(&self, activity_id: &str) -> Result<Option<ActivityRecord>>;

    /// Insert a row unless one exists. Returns whether a row was created.
    fn insert(&self, record: &ActivityRecord) -> Result<bool>;

    /// Replace the progress columns of an existing, unfinished row.
    fn update(&self, update: &ProgressUpdate) -> Result<()>;

    /// All rows ordered by `activity_id`.
    fn list(&self) -> Result<Vec<ActivityRecord>>;
}

/// Table layout shared by the store implementations.
pub(crate) type ActivityTable = BTreeMap<String, ActivityRecord>;

/// Insert-if-absent against a table.
pub(crate) fn insert_row(table: &mut ActivityTable, record: &ActivityRecord) -> bool {
    if table.contains_key(&record.activity_id) {
        return false;
    }
    table.insert(record.activity_id.clone(), record.clone());
    true
}

/// Apply an update against a table, refusing finished or missing rows.
pub(crate) fn update_row(table: &mut ActivityTable, update: &ProgressUpdate) -> Result<()> {
    let row = table
        .get_mut(&update.activity_id)
        .ok_or_else(|| StepwiseError::Persistence {
            activity_id: update.activity_id.clone(),
            message: "no row to update".to_string(),
        })?;

    if row.is_finished {
        return Err(StepwiseError::ActivityFinished {
            activity_id: update.activity_id.clone(),
        });
    }

    row.apply(update);
    Ok(())
}

/// Process-local store, used by tests and embedders without durability needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryTable>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: ActivityTable,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given rows, as if restored after a crash.
    pub fn with_records(records: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|r| (r.activity_id.clone(), r))
            .collect();
        Self {
            inner: Mutex::new(MemoryTable { rows, writes: 0 }),
        }
    }

    /// Number of successful inserts and updates.
    pub fn write_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
    }
}

impl ActivityStore for MemoryStore {
    fn fetch(&self, activity_id: &str) -> Result<Option<ActivityRecord>> {
        let table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(table.rows.get(activity_id).cloned())
    }

    fn insert(&self, record: &ActivityRecord) -> Result<bool> {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let created = insert_row(&mut table.rows, record);
        if created {
            table.writes += 1;
        }
        Ok(created)
    }

    fn update(&self, update: &ProgressUpdate) -> Result<()> {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        update_row(&mut table.rows, update)?;
        table.writes += 1;
        Ok(())
    }

    fn list(&self) -> Result<Vec<ActivityRecord>> {
        let table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(table.rows.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityMetadata;

    fn record(id: &str, state: &str) -> ActivityRecord {
        let update = ProgressUpdate::now(id, state, false, None);
        ActivityRecord::first_progress(id, &ActivityMetadata::new("mess"), &update)
    }

    #[test]
    fn fetch_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.fetch("001").unwrap().is_none());
    }

    #[test]
    fn insert_is_insert_if_absent() {
        let store = MemoryStore::new();
        assert!(store.insert(&record("001", "read_file")).unwrap());
        assert!(!store.insert(&record("001", "exit")).unwrap());

        let row = store.fetch("001").unwrap().unwrap();
        assert_eq!(row.current_state.as_deref(), Some("read_file"));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn update_replaces_progress() {
        let store = MemoryStore::with_records([record("001", "read_file")]);
        store
            .update(&ProgressUpdate::now("001", "apply_regex", false, Some("e".into())))
            .unwrap();

        let row = store.fetch("001").unwrap().unwrap();
        assert_eq!(row.current_state.as_deref(), Some("apply_regex"));
        assert_eq!(row.external_id.as_deref(), Some("e"));
    }

    #[test]
    fn update_missing_row_fails() {
        let store = MemoryStore::new();
        let err = store
            .update(&ProgressUpdate::now("001", "read_file", false, None))
            .unwrap_err();
        assert!(matches!(err, StepwiseError::Persistence { .. }));
    }

    #[test]
    fn update_finished_row_fails() {
        let store = MemoryStore::with_records([record("001", "read_file")]);
        store
            .update(&ProgressUpdate::now("001", "exit", true, None))
            .unwrap();

        let err = store
            .update(&ProgressUpdate::now("001", "exit", true, None))
            .unwrap_err();
        assert!(matches!(err, StepwiseError::ActivityFinished { .. }));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn list_is_sorted_by_id() {
        let store = MemoryStore::with_records([record("b", "x"), record("a", "y")]);
        let ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.activity_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
