//! List command implementation.
//!
//! The `stepwise list` command prints every persisted activity.

use std::io::Write;
use std::path::PathBuf;

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::state::{ActivityStore, YamlStore};

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    store_path: PathBuf,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(store_path: PathBuf, args: ListArgs) -> Self {
        Self { store_path, args }
    }
}

impl Command for ListCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let records = YamlStore::open(&self.store_path).list()?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&records).map_err(anyhow::Error::from)?;
            writeln!(out, "{}", json)?;
            return Ok(CommandResult::success());
        }

        if records.is_empty() {
            writeln!(out, "No activities in {}", self.store_path.display())?;
            return Ok(CommandResult::success());
        }

        let id_width = records
            .iter()
            .map(|r| r.activity_id.len())
            .max()
            .unwrap_or(0)
            .max("ID".len());

        writeln!(out, "{:<id_width$}  {:<8}  {:<20}  NAME", "ID", "FINISHED", "STATE")?;
        for record in &records {
            writeln!(
                out,
                "{:<id_width$}  {:<8}  {:<20}  {}",
                record.activity_id,
                if record.is_finished { "yes" } else { "no" },
                record.current_state.as_deref().unwrap_or("-"),
                record.activity_name,
            )?;
        }

        Ok(CommandResult::success())
    }
}
