//! Command-line interface for stepwise.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ListArgs, RunArgs, StatusArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
