//! Step registry.
//!
//! The registry maps step names to actions in canonical order. Its last
//! entry is the terminal step: completing it finishes the activity. New
//! steps may be appended while an activity runs; existing entries are never
//! removed or reordered.

use std::collections::HashMap;

use crate::error::{Result, StepwiseError};

use super::action::{Step, StepAction};

/// Ordered mapping from step name to action.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
}

impl StepRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new registry builder.
    pub fn builder() -> StepRegistryBuilder {
        StepRegistryBuilder::new()
    }

    /// Append a step after every existing entry.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if self.index.contains_key(step.name()) {
            return Err(StepwiseError::DuplicateStep {
                step: step.name().to_string(),
            });
        }
        self.index.insert(step.name().to_string(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Check if a step is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get a step for invocation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Step> {
        let idx = *self.index.get(name)?;
        self.steps.get_mut(idx)
    }

    /// Registered names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Step::name)
    }

    /// The step whose completion finishes the activity.
    pub fn terminal(&self) -> Option<&str> {
        self.steps.last().map(Step::name)
    }

    /// Whether `name` is currently the terminal step.
    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminal() == Some(name)
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builder for constructing a [`StepRegistry`].
#[derive(Default)]
pub struct StepRegistryBuilder {
    steps: Vec<Step>,
}

impl StepRegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closure step after those already added.
    pub fn step<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> anyhow::Result<bool> + Send + 'static,
    {
        self.steps.push(Step::new(name, action));
        self
    }

    /// Add a step backed by a [`StepAction`] implementation.
    pub fn action(mut self, name: impl Into<String>, action: impl StepAction + 'static) -> Self {
        self.steps.push(Step::with_action(name, action));
        self
    }

    /// Build the registry.
    ///
    /// Returns an error if no steps were added or a name repeats.
    pub fn build(self) -> Result<StepRegistry> {
        if self.steps.is_empty() {
            return Err(StepwiseError::EmptyRegistry);
        }

        let mut registry = StepRegistry::new();
        for step in self.steps {
            registry.register(step)?;
        }
        Ok(registry)
    }
}
