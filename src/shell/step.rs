//! Shell commands as step actions.

use std::path::PathBuf;
use tracing::debug;

use super::command::{execute, CommandOptions};
use crate::config::StepConfig;
use crate::error::StepwiseError;
use crate::steps::{Step, StepAction};

/// A step action that runs one shell command.
///
/// Exit code 0 is success. Any other exit code, or failing to start the
/// shell, is an error carrying the command and its stderr.
#[derive(Debug, Clone)]
pub struct CommandStep {
    command: String,
    options: CommandOptions,
}

impl CommandStep {
    /// Run `command` with the inherited environment.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: CommandOptions {
                capture_stdout: true,
                capture_stderr: true,
                ..Default::default()
            },
        }
    }

    /// Build from an activity file entry, running in `cwd`.
    pub fn from_config(config: &StepConfig, cwd: Option<PathBuf>) -> Self {
        let mut step = Self::new(config.command.clone());
        step.options.env = config.env.clone();
        step.options.cwd = cwd;
        step
    }

    /// The command line.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Bind this command to a step name.
    pub fn into_step(self, name: impl Into<String>) -> Step {
        Step::with_action(name, self)
    }
}

impl StepAction for CommandStep {
    fn run(&mut self) -> anyhow::Result<bool> {
        let result = execute(&self.command, &self.options)?;
        debug!(
            "Command '{}' exited with {:?} after {:?}",
            self.command, result.exit_code, result.duration
        );

        if result.success {
            return Ok(true);
        }

        let error = anyhow::Error::new(StepwiseError::CommandFailed {
            command: self.command.clone(),
            code: result.exit_code,
        });
        let stderr = result.stderr.trim();
        if stderr.is_empty() {
            Err(error)
        } else {
            Err(error.context(stderr.to_string()))
        }
    }
}
