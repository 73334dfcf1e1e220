//! Shell command execution for command-backed steps.

pub mod command;
pub mod step;

pub use command::{execute, CommandOptions, CommandResult};
pub use step::CommandStep;
