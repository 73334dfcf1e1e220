//! Step actions.
//!
//! A step action is a zero-argument unit of work that reports success or
//! failure. Returning `Ok(false)`, returning `Err(_)` and panicking are all
//! failures; the worker treats them the same way.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// The work performed by a single step.
///
/// Implemented for every `FnMut() -> anyhow::Result<bool> + Send` closure, so
/// most callers never implement it by hand.
pub trait StepAction: Send {
    /// Perform the step. `Ok(true)` means the step completed.
    fn run(&mut self) -> anyhow::Result<bool>;
}

impl<F> StepAction for F
where
    F: FnMut() -> anyhow::Result<bool> + Send,
{
    fn run(&mut self) -> anyhow::Result<bool> {
        self()
    }
}

/// How a single invocation of a step action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action returned `Ok(true)`.
    Succeeded,

    /// The action returned `Ok(false)`.
    Declined,

    /// The action returned an error or panicked.
    Errored(String),
}

impl ActionOutcome {
    /// Whether the step may be recorded as completed.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }

    /// Human readable failure detail, if any.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            ActionOutcome::Succeeded => None,
            ActionOutcome::Declined => Some("action reported failure".to_string()),
            ActionOutcome::Errored(message) => Some(message.clone()),
        }
    }
}

/// A named step bound to its action.
pub struct Step {
    name: String,
    action: Box<dyn StepAction>,
}

impl Step {
    /// Bind a closure to a step name.
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> anyhow::Result<bool> + Send + 'static,
    {
        Self::with_action(name, action)
    }

    /// Bind any [`StepAction`] implementation to a step name.
    pub fn with_action(name: impl Into<String>, action: impl StepAction + 'static) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the action once, converting errors and panics into an outcome.
    pub fn invoke(&mut self) -> ActionOutcome {
        let action = &mut self.action;
        match panic::catch_unwind(AssertUnwindSafe(|| action.run())) {
            Ok(Ok(true)) => ActionOutcome::Succeeded,
            Ok(Ok(false)) => ActionOutcome::Declined,
            Ok(Err(e)) => ActionOutcome::Errored(format!("{:#}", e)),
            Err(payload) => ActionOutcome::Errored(panic_message(payload.as_ref())),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn succeeded_on_true() {
        let mut step = Step::new("ok", || Ok(true));
        assert_eq!(step.invoke(), ActionOutcome::Succeeded);
        assert!(step.invoke().is_success());
    }

    #[test]
    fn declined_on_false() {
        let mut step = Step::new("no", || Ok(false));
        let outcome = step.invoke();
        assert_eq!(outcome, ActionOutcome::Declined);
        assert!(outcome.failure_message().is_some());
    }

    #[test]
    fn errored_carries_message() {
        let mut step = Step::new("err", || bail!("file not readable"));
        match step.invoke() {
            ActionOutcome::Errored(msg) => assert!(msg.contains("file not readable")),
            other => panic!("Expected Errored, got {:?}", other),
        }
    }

    #[test]
    fn panic_is_caught() {
        let mut step = Step::new("boom", || -> anyhow::Result<bool> { panic!("kaboom") });
        match step.invoke() {
            ActionOutcome::Errored(msg) => assert!(msg.contains("kaboom")),
            other => panic!("Expected Errored, got {:?}", other),
        }
    }

    #[test]
    fn stateful_closure_keeps_state() {
        let mut calls = 0;
        let mut step = Step::new("count", move || {
            calls += 1;
            Ok(calls > 1)
        });
        assert_eq!(step.invoke(), ActionOutcome::Declined);
        assert_eq!(step.invoke(), ActionOutcome::Succeeded);
    }

    #[test]
    fn debug_shows_name() {
        let step = Step::new("read_file", || Ok(true));
        assert!(format!("{:?}", step).contains("read_file"));
    }
}
