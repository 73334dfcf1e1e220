//! Activity file validation rules.
//!
//! - The activity must have a name
//! - There must be at least one step
//! - Step names must be non-empty and unique
//! - Every step must have a command

use std::collections::HashSet;

use crate::config::schema::ActivityConfig;
use crate::error::{Result, StepwiseError};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
}

/// Validate an activity file and return all errors.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_config(config: &ActivityConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.activity_name.trim().is_empty() {
        errors.push(ValidationError {
            rule: "missing-activity-name".to_string(),
            message: "'activity_name' must be set".to_string(),
            step: None,
        });
    }

    if config.steps.is_empty() {
        errors.push(ValidationError {
            rule: "no-steps".to_string(),
            message: "At least one step is required".to_string(),
            step: None,
        });
    }

    let mut seen = HashSet::new();
    for (index, step) in config.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-step-name".to_string(),
                message: format!("Step #{} has no name", index + 1),
                step: None,
            });
            continue;
        }

        if !seen.insert(step.name.as_str()) {
            errors.push(ValidationError {
                rule: "duplicate-step".to_string(),
                message: format!("Step '{}' is defined more than once", step.name),
                step: Some(step.name.clone()),
            });
        }

        if step.command.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-command".to_string(),
                message: format!("Step '{}' must have a 'command'", step.name),
                step: Some(step.name.clone()),
            });
        }
    }

    errors
}

/// Validate an activity file, failing on the first batch of errors.
pub fn validate(config: &ActivityConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    Err(StepwiseError::ConfigValidationError {
        message: errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    })
}
