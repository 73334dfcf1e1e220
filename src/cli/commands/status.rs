//! Status command implementation.
//!
//! The `stepwise status` command prints the persisted row of one activity.

use std::io::Write;
use std::path::PathBuf;

use crate::cli::args::StatusArgs;
use crate::error::Result;
use crate::runner::is_worker_alive;
use crate::state::{ActivityRecord, ActivityStore, YamlStore};

use super::dispatcher::{Command, CommandResult};

/// The status command implementation.
pub struct StatusCommand {
    store_path: PathBuf,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(store_path: PathBuf, args: StatusArgs) -> Self {
        Self { store_path, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &StatusArgs {
        &self.args
    }
}

impl Command for StatusCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let store = YamlStore::open(&self.store_path);

        let Some(record) = store.fetch(&self.args.id)? else {
            writeln!(
                out,
                "No activity '{}' in {}",
                self.args.id,
                self.store_path.display()
            )?;
            return Ok(CommandResult::failure(2));
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&record).map_err(anyhow::Error::from)?;
            writeln!(out, "{}", json)?;
        } else {
            write_record(out, &record)?;
        }

        Ok(CommandResult::success())
    }
}

fn write_record(out: &mut dyn Write, record: &ActivityRecord) -> std::io::Result<()> {
    writeln!(out, "Activity:  {}", record.activity_id)?;
    writeln!(out, "Name:      {}", record.activity_name)?;
    writeln!(
        out,
        "Created:   {}",
        record.activity_creation_date.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    match (&record.current_state, record.current_state_creation_date) {
        (Some(state), Some(at)) => writeln!(
            out,
            "State:     {} (since {})",
            state,
            at.format("%Y-%m-%d %H:%M:%S UTC")
        )?,
        (Some(state), None) => writeln!(out, "State:     {}", state)?,
        (None, _) => writeln!(out, "State:     (not started)")?,
    }
    writeln!(
        out,
        "Finished:  {}",
        if record.is_finished { "yes" } else { "no" }
    )?;
    if let Some(external_id) = &record.external_id {
        writeln!(out, "External:  {}", external_id)?;
    }
    // Only workers in this process are visible.
    if is_worker_alive(&record.activity_id) {
        writeln!(out, "Worker:    running")?;
    }
    Ok(())
}
