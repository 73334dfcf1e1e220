//! Persistent activity state.
//!
//! This module provides the row store holding one record per activity:
//! its last completed step, whether it finished, and its timestamps.
//!
//! - [`ActivityRecord`] - One row of the activity table
//! - [`ProgressUpdate`] - The columns written after each completed step
//! - [`ActivityStore`] - Store contract used by workers
//! - [`MemoryStore`] / [`YamlStore`] - Process-local and file-backed stores

pub mod record;
pub mod store;
pub mod yaml;

pub use record::{ActivityRecord, ProgressUpdate};
pub use store::{ActivityStore, MemoryStore};
pub use yaml::YamlStore;
