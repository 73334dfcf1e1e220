//! File-backed row store.
//!
//! The whole activity table lives in one YAML file keyed by `activity_id`.
//! Every write rewrites the file with the write-to-temp-then-rename pattern,
//! so a crash leaves either the old table or the new one on disk.
//!
//! Every store opened on the same file within one process shares a single
//! lock, so independent workers never overwrite each other's rows.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, StepwiseError};

use super::record::{ActivityRecord, ProgressUpdate};
use super::store::{insert_row, update_row, ActivityStore, ActivityTable};

/// On-disk layout of the table file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    /// Schema version for migration.
    version: u32,

    #[serde(default)]
    activities: ActivityTable,
}

// resolved table path -> lock shared by every store on that file
static TABLE_LOCKS: Mutex<BTreeMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(BTreeMap::new());

/// Resolve `path` through its nearest existing ancestor so that spellings
/// of the same file map to one key whether or not the file exists yet.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    for ancestor in absolute.ancestors() {
        let Ok(resolved) = fs::canonicalize(ancestor) else {
            continue;
        };
        return match absolute.strip_prefix(ancestor) {
            Ok(rest) if rest.as_os_str().is_empty() => resolved,
            Ok(rest) => resolved.join(rest),
            Err(_) => absolute.clone(),
        };
    }
    absolute
}

fn table_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = TABLE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(lock_key(path)).or_default())
}

/// Row store persisted as a YAML file.
#[derive(Debug)]
pub struct YamlStore {
    path: PathBuf,
    // Serialises read-modify-write cycles on this file within the process.
    lock: Arc<Mutex<()>>,
}

impl YamlStore {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Default table location, relative to the working directory.
    pub const DEFAULT_PATH: &'static str = ".stepwise/activities.yml";

    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = table_lock(&path);
        Self { path, lock }
    }

    /// Get the table file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ActivityTable> {
        if !self.path.exists() {
            return Ok(ActivityTable::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ActivityTable::new());
        }

        let file: TableFile =
            serde_yaml::from_str(&content).map_err(|e| StepwiseError::StoreFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        Ok(file.activities)
    }

    fn save(&self, activities: ActivityTable) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let file = TableFile {
            version: Self::CURRENT_VERSION,
            activities,
        };
        let content = serde_yaml::to_string(&file).map_err(|e| StepwiseError::StoreFailed {
            path: self.path.clone(),
            message: format!("failed to serialize activity table: {}", e),
        })?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote activity table to {}", self.path.display());
        Ok(())
    }
}

impl ActivityStore for YamlStore {
    fn fetch(&self, activity_id: &str) -> Result<Option<ActivityRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(activity_id))
    }

    fn insert(&self, record: &ActivityRecord) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut table = self.load()?;
        if !insert_row(&mut table, record) {
            return Ok(false);
        }
        self.save(table)?;
        Ok(true)
    }

    fn update(&self, update: &ProgressUpdate) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut table = self.load()?;
        update_row(&mut table, update)?;
        self.save(table)
    }

    fn list(&self) -> Result<Vec<ActivityRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityMetadata;
    use tempfile::TempDir;

    fn record(id: &str, state: &str) -> ActivityRecord {
        let update = ProgressUpdate::now(id, state, false, None);
        ActivityRecord::first_progress(id, &ActivityMetadata::new("mess"), &update)
    }

    #[test]
    fn missing_file_is_empty_table() {
        let temp = TempDir::new().unwrap();
        let store = YamlStore::open(temp.path().join("activities.yml"));
        assert!(store.fetch("001").unwrap().is_none());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn insert_and_fetch_round_trip_through_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("activities.yml");
        let store = YamlStore::open(&path);
        let row = record("001", "read_file");

        assert!(store.insert(&row).unwrap());
        assert!(path.exists());

        let reopened = YamlStore::open(&path);
        assert_eq!(reopened.fetch("001").unwrap(), Some(row));
    }

    #[test]
    fn update_persists_progress() {
        let temp = TempDir::new().unwrap();
        let store = YamlStore::open(temp.path().join("activities.yml"));
        store.insert(&record("001", "read_file")).unwrap();

        store
            .update(&ProgressUpdate::now("001", "exit", true, None))
            .unwrap();

        let row = store.fetch("001").unwrap().unwrap();
        assert_eq!(row.current_state.as_deref(), Some("exit"));
        assert!(row.is_finished);
    }

    #[test]
    fn finished_row_rejects_updates() {
        let temp = TempDir::new().unwrap();
        let store = YamlStore::open(temp.path().join("activities.yml"));
        store.insert(&record("001", "read_file")).unwrap();
        store
            .update(&ProgressUpdate::now("001", "exit", true, None))
            .unwrap();

        let err = store
            .update(&ProgressUpdate::now("001", "exit", true, None))
            .unwrap_err();
        assert!(matches!(err, StepwiseError::ActivityFinished { .. }));
    }

    #[test]
    fn save_uses_atomic_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activities.yml");
        let store = YamlStore::open(&path);
        store.insert(&record("001", "read_file")).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(
            leftovers,
            [std::ffi::OsString::from("activities.yml")],
            "Temp file should not exist after successful save"
        );
    }

    #[test]
    fn stores_on_one_file_share_a_lock() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activities.yml");
        let first = YamlStore::open(&path);
        first.insert(&record("001", "read_file")).unwrap();

        let spelled_differently = temp.path().join(".").join("activities.yml");
        let second = YamlStore::open(spelled_differently);
        assert!(Arc::ptr_eq(&first.lock, &second.lock));

        let other = YamlStore::open(temp.path().join("other.yml"));
        assert!(!Arc::ptr_eq(&first.lock, &other.lock));
    }

    #[test]
    fn rows_are_independent() {
        let temp = TempDir::new().unwrap();
        let store = YamlStore::open(temp.path().join("activities.yml"));
        store.insert(&record("001", "read_file")).unwrap();
        store.insert(&record("002", "read_file")).unwrap();
        store
            .update(&ProgressUpdate::now("002", "exit", true, None))
            .unwrap();

        let first = store.fetch("001").unwrap().unwrap();
        assert_eq!(first.current_state.as_deref(), Some("read_file"));
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn corrupt_table_is_a_store_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activities.yml");
        fs::write(&path, "activities: [not, a, map").unwrap();

        let store = YamlStore::open(&path);
        let err = store.fetch("001").unwrap_err();
        assert!(matches!(err, StepwiseError::StoreFailed { .. }));
        assert!(!err.is_configuration());

        let err = store.insert(&record("001", "read_file")).unwrap_err();
        assert!(matches!(err, StepwiseError::StoreFailed { .. }));
    }
}
