//! Activity files for the `stepwise` binary.
//!
//! - Schema definitions in [`schema`]
//! - Loading and store path resolution in [`loader`]
//! - Validation in [`validator`]
//! - Appended-step detection in [`watch`]
//!
//! # Example
//!
//! ```
//! use stepwise::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("activity.yml");
//! fs::write(&path, "activity_name: demo\nsteps:\n  - name: hello\n    command: echo hi\n").unwrap();
//!
//! let config = load_config(&path).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.steps[0].name, "hello");
//! ```

pub mod loader;
pub mod schema;
pub mod validator;
pub mod watch;

pub use loader::{load_config, parse_config, resolve_store_path};
pub use schema::{ActivityConfig, Settings, StepConfig};
pub use validator::{validate, validate_config, ValidationError};
pub use watch::ConfigWatcher;
