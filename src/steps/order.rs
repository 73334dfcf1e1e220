//! Append-only step order.
//!
//! The order lists the step names released for execution. Progress through
//! it is tracked as a cursor (the count of completed positions), so the due
//! steps are always the slice after the cursor.

use std::collections::HashMap;

use crate::error::{Result, StepwiseError};

/// Append-only sequence of step names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOrder {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl StepOrder {
    /// Create an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an order from names, rejecting repeats.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self::new();
        for name in names {
            order.append(name)?;
        }
        Ok(order)
    }

    /// Append a name to the end of the order and return its position.
    pub fn append(&mut self, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        if self.positions.contains_key(&name) {
            return Err(StepwiseError::DuplicateStep { step: name });
        }
        let position = self.names.len();
        self.positions.insert(name.clone(), position);
        self.names.push(name);
        Ok(position)
    }

    /// Position of a name in the order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Steps not yet completed when `cursor` positions are done.
    pub fn due_from(&self, cursor: usize) -> &[String] {
        self.names.get(cursor..).unwrap_or(&[])
    }

    /// Name at a position.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }

    /// Last name in the order.
    pub fn last(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// All names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of names in the order.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the order is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
