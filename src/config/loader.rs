//! Activity file loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ActivityConfig;
use crate::error::{Result, StepwiseError};
use crate::state::YamlStore;

/// Load and parse an activity file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config(path: &Path) -> Result<ActivityConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepwiseError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepwiseError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into an [`ActivityConfig`].
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<ActivityConfig> {
    serde_yaml::from_str(content).map_err(|e| StepwiseError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve the row store location for an activity file.
///
/// An explicit override wins. Otherwise `settings.store` is taken relative
/// to the activity file's directory, falling back to
/// [`YamlStore::DEFAULT_PATH`] in the same directory.
pub fn resolve_store_path(
    config: &ActivityConfig,
    config_path: &Path,
    store_override: Option<&Path>,
) -> PathBuf {
    if let Some(path) = store_override {
        return path.to_path_buf();
    }

    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    let relative = config
        .settings
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(YamlStore::DEFAULT_PATH));

    if relative.is_absolute() {
        relative
    } else {
        base.join(relative)
    }
}
