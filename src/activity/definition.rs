//! Activity metadata and validated definitions.

use chrono::{DateTime, Utc};

use crate::error::{Result, StepwiseError};
use crate::steps::{StepOrder, StepRegistry};

/// Descriptive data written with the activity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMetadata {
    /// Descriptive name, set once.
    pub activity_name: String,

    /// When the activity was created.
    pub created_at: DateTime<Utc>,

    /// Opaque correlation id.
    pub external_id: Option<String>,
}

impl ActivityMetadata {
    /// Metadata for an activity created now.
    pub fn new(activity_name: impl Into<String>) -> Self {
        Self {
            activity_name: activity_name.into(),
            created_at: Utc::now(),
            external_id: None,
        }
    }

    /// Attach a correlation id.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Everything a worker needs to drive one activity.
///
/// The order lists the step names released for execution. It defaults to
/// every registered step; pass a shorter order to release steps gradually
/// through [`ActivityHandle::append_step`](crate::runner::ActivityHandle::append_step).
#[derive(Debug)]
pub struct ActivityDefinition {
    metadata: ActivityMetadata,
    registry: StepRegistry,
    order: StepOrder,
}

impl ActivityDefinition {
    /// Define an activity that runs every registered step.
    pub fn new(metadata: ActivityMetadata, registry: StepRegistry) -> Result<Self> {
        let order = StepOrder::from_names(registry.names().map(String::from))?;
        Self::with_order(metadata, registry, order)
    }

    /// Define an activity with an explicit initial order.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata name is blank, the registry or
    /// order is empty, the order names an unregistered step, or the order
    /// is not a prefix of the registry.
    pub fn with_order(
        metadata: ActivityMetadata,
        registry: StepRegistry,
        order: StepOrder,
    ) -> Result<Self> {
        if metadata.activity_name.trim().is_empty() {
            return Err(StepwiseError::MissingMetadata {
                field: "activity_name".to_string(),
            });
        }

        if registry.is_empty() {
            return Err(StepwiseError::EmptyRegistry);
        }

        if order.is_empty() {
            return Err(StepwiseError::ConfigValidationError {
                message: "step order is empty".to_string(),
            });
        }

        if let Some(missing) = order.names().iter().find(|n| !registry.contains(n)) {
            return Err(StepwiseError::UnregisteredStep {
                step: missing.clone(),
            });
        }

        let diverged = order
            .names()
            .iter()
            .zip(registry.names())
            .find(|(released, registered)| released.as_str() != *registered);
        if let Some((released, registered)) = diverged {
            return Err(StepwiseError::OrderDiverged {
                message: format!(
                    "step '{}' released where the registry has '{}'",
                    released, registered
                ),
            });
        }

        Ok(Self {
            metadata,
            registry,
            order,
        })
    }

    /// Activity metadata.
    pub fn metadata(&self) -> &ActivityMetadata {
        &self.metadata
    }

    /// Registered steps.
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Released step order.
    pub fn order(&self) -> &StepOrder {
        &self.order
    }

    /// Split into parts for the worker.
    pub fn into_parts(self) -> (ActivityMetadata, StepRegistry, StepOrder) {
        (self.metadata, self.registry, self.order)
    }
}
