//! Activity file change detection.
//!
//! [`ConfigWatcher`] remembers the content hash of the activity file and the
//! step names it has already handed out. When the file changes, only new
//! trailing steps are accepted; anything else means the step order diverged
//! from what the worker may already have executed.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::loader::parse_config;
use super::schema::{ActivityConfig, StepConfig};
use super::validator::validate;
use crate::error::{Result, StepwiseError};

/// Watches an activity file for appended steps.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    hash: String,
    known: Vec<String>,
}

impl ConfigWatcher {
    /// Start watching `path`, treating the steps of `config` as already known.
    pub fn new(path: impl Into<PathBuf>, config: &ActivityConfig) -> Result<Self> {
        let path = path.into();
        let hash = hash_file(&path)?;
        Ok(Self {
            path,
            hash,
            known: config.steps.iter().map(|s| s.name.clone()).collect(),
        })
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Step names handed out so far.
    pub fn known_steps(&self) -> &[String] {
        &self.known
    }

    /// Check the file and return any newly appended steps.
    ///
    /// Returns an empty list when the file is unchanged.
    ///
    /// # Errors
    ///
    /// Parse and validation errors leave the watcher untouched so the next
    /// poll retries. A change that removes, renames or reorders known steps
    /// returns [`StepwiseError::OrderDiverged`].
    pub fn poll(&mut self) -> Result<Vec<StepConfig>> {
        let content = fs::read_to_string(&self.path)?;
        let hash = hash_content(&content);
        if hash == self.hash {
            return Ok(Vec::new());
        }

        let config = parse_config(&content, &self.path)?;
        validate(&config)?;

        let names: Vec<&str> = config.steps.iter().map(|s| s.name.as_str()).collect();
        let is_append = names.len() >= self.known.len()
            && self.known.iter().zip(&names).all(|(a, b)| a == b);
        if !is_append {
            return Err(StepwiseError::OrderDiverged {
                message: format!(
                    "known steps [{}] are no longer a prefix of [{}]",
                    self.known.join(", "),
                    names.join(", ")
                ),
            });
        }

        let appended: Vec<StepConfig> = config.steps[self.known.len()..].to_vec();
        debug!(
            "Activity file {} changed, {} new step(s)",
            self.path.display(),
            appended.len()
        );

        self.known.extend(appended.iter().map(|s| s.name.clone()));
        self.hash = hash;
        Ok(appended)
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepwiseError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepwiseError::Io(e)
        }
    })?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_STEPS: &str = "activity_name: mess\nsteps:\n  - name: a\n    command: echo a\n  - name: b\n    command: echo b\n";

    fn setup(content: &str) -> (TempDir, PathBuf, ConfigWatcher) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activity.yml");
        fs::write(&path, content).unwrap();
        let config = parse_config(content, &path).unwrap();
        let watcher = ConfigWatcher::new(&path, &config).unwrap();
        (temp, path, watcher)
    }

    #[test]
    fn unchanged_file_yields_nothing() {
        let (_temp, _path, mut watcher) = setup(TWO_STEPS);
        assert!(watcher.poll().unwrap().is_empty());
        assert_eq!(watcher.known_steps(), ["a", "b"]);
    }

    #[test]
    fn appended_steps_are_returned_once() {
        let (_temp, path, mut watcher) = setup(TWO_STEPS);
        fs::write(
            &path,
            format!("{TWO_STEPS}  - name: c\n    command: echo c\n"),
        )
        .unwrap();

        let appended = watcher.poll().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].name, "c");
        assert!(watcher.poll().unwrap().is_empty());
        assert_eq!(watcher.known_steps(), ["a", "b", "c"]);
    }

    #[test]
    fn reorder_is_rejected() {
        let (_temp, path, mut watcher) = setup(TWO_STEPS);
        fs::write(
            &path,
            "activity_name: mess\nsteps:\n  - name: b\n    command: echo b\n  - name: a\n    command: echo a\n",
        )
        .unwrap();

        let err = watcher.poll().unwrap_err();
        assert!(matches!(err, StepwiseError::OrderDiverged { .. }));
    }

    #[test]
    fn removal_is_rejected() {
        let (_temp, path, mut watcher) = setup(TWO_STEPS);
        fs::write(&path, "activity_name: mess\nsteps:\n  - name: a\n    command: echo a\n").unwrap();

        assert!(matches!(
            watcher.poll(),
            Err(StepwiseError::OrderDiverged { .. })
        ));
    }

    #[test]
    fn broken_edit_is_retried() {
        let (_temp, path, mut watcher) = setup(TWO_STEPS);
        fs::write(&path, "steps: [unclosed").unwrap();
        assert!(matches!(
            watcher.poll(),
            Err(StepwiseError::ConfigParseError { .. })
        ));

        fs::write(
            &path,
            format!("{TWO_STEPS}  - name: c\n    command: echo c\n"),
        )
        .unwrap();
        assert_eq!(watcher.poll().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = ConfigWatcher::new(temp.path().join("gone.yml"), &ActivityConfig::default())
            .unwrap_err();
        assert!(matches!(err, StepwiseError::ConfigNotFound { .. }));
    }
}
