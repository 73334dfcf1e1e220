//! Activity definitions.
//!
//! An activity is one tracked unit of work advancing through an ordered
//! step sequence. [`ActivityDefinition`] bundles everything a worker needs
//! and validates it up front so misconfiguration fails at construction.

pub mod definition;

pub use definition::{ActivityDefinition, ActivityMetadata};
