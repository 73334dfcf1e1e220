//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::state::YamlStore;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing user-facing output to `out`.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    working_dir: PathBuf,
    store: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a dispatcher resolving relative paths against `working_dir`.
    pub fn new(working_dir: PathBuf, store: Option<PathBuf>) -> Self {
        Self { working_dir, store }
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Row store used by commands that have no activity file.
    pub fn default_store_path(&self) -> PathBuf {
        match &self.store {
            Some(path) => self.working_dir.join(path),
            None => self.working_dir.join(YamlStore::DEFAULT_PATH),
        }
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        match &cli.command {
            Commands::Run(args) => {
                let store = self.store.as_ref().map(|p| self.working_dir.join(p));
                let cmd = super::run::RunCommand::new(&self.working_dir, store, args.clone());
                cmd.execute(out)
            }
            Commands::Status(args) => {
                let cmd = super::status::StatusCommand::new(self.default_store_path(), args.clone());
                cmd.execute(out)
            }
            Commands::List(args) => {
                let cmd = super::list::ListCommand::new(self.default_store_path(), args.clone());
                cmd.execute(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn default_store_path_is_under_working_dir() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/work"), None);
        assert_eq!(
            dispatcher.default_store_path(),
            PathBuf::from("/work/.stepwise/activities.yml")
        );
    }

    #[test]
    fn store_override_is_relative_to_working_dir() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/work"), Some("rows.yml".into()));
        assert_eq!(dispatcher.default_store_path(), PathBuf::from("/work/rows.yml"));

        let absolute = CommandDispatcher::new(PathBuf::from("/work"), Some("/tmp/rows.yml".into()));
        assert_eq!(absolute.default_store_path(), PathBuf::from("/tmp/rows.yml"));
    }
}
