//! Run command implementation.
//!
//! The `stepwise run` command turns an activity file into command-backed
//! steps, starts a worker for the given id and waits for it to exit. A rerun
//! with the same id resumes after the last persisted step.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::activity::{ActivityDefinition, ActivityMetadata};
use crate::cli::args::RunArgs;
use crate::config::{load_config, resolve_store_path, validate, ActivityConfig, ConfigWatcher};
use crate::error::{Result, StepwiseError};
use crate::runner::{ActivityHandle, ActivityWorker, WorkerOptions, WorkerPhase};
use crate::shell::CommandStep;
use crate::steps::StepRegistry;

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    working_dir: PathBuf,
    store: Option<PathBuf>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(working_dir: &Path, store: Option<PathBuf>, args: RunArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            store,
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn config_path(&self) -> PathBuf {
        self.working_dir.join(&self.args.config)
    }

    /// Step commands run next to the activity file.
    fn step_dir(&self) -> Option<PathBuf> {
        self.config_path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    fn definition(&self, config: &ActivityConfig) -> Result<ActivityDefinition> {
        let cwd = self.step_dir();
        let registry = config
            .steps
            .iter()
            .fold(StepRegistry::builder(), |builder, step| {
                builder.action(
                    step.name.clone(),
                    CommandStep::from_config(step, cwd.clone()),
                )
            })
            .build()?;

        let mut metadata = ActivityMetadata::new(config.activity_name.clone());
        if let Some(external_id) = self.args.external_id.as_ref().or(config.external_id.as_ref()) {
            metadata = metadata.with_external_id(external_id.clone());
        }

        ActivityDefinition::new(metadata, registry)
    }

    fn options(&self, config: &ActivityConfig) -> WorkerOptions {
        match self.args.poll_interval_ms {
            Some(ms) => WorkerOptions {
                poll_interval: Duration::from_millis(ms),
            },
            None => config.settings.worker_options(),
        }
    }

    /// Forward appended steps to the worker until it exits.
    fn watch(&self, handle: &ActivityHandle, config: &ActivityConfig, interval: Duration) -> Result<()> {
        let mut watcher = ConfigWatcher::new(self.config_path(), config)?;
        let cwd = self.step_dir();

        while !handle.wait_until(interval, |s| s.phase.is_terminal()) {
            match watcher.poll() {
                Ok(appended) if appended.is_empty() => {}
                Ok(appended) => {
                    for step in &appended {
                        info!("Appending step '{}' from {}", step.name, watcher.path().display());
                        handle.register_action(
                            step.name.clone(),
                            CommandStep::from_config(step, cwd.clone()),
                        );
                    }
                    handle.notify();
                }
                Err(e @ StepwiseError::OrderDiverged { .. }) => {
                    error!("Stopping activity '{}': {}", handle.activity_id(), e);
                    handle.stop();
                    return Err(e);
                }
                Err(e) => warn!("Ignoring activity file change: {}", e),
            }
        }

        Ok(())
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let config_path = self.config_path();
        let config = load_config(&config_path)?;
        validate(&config)?;

        let store_path = resolve_store_path(&config, &config_path, self.store.as_deref());
        let options = self.options(&config);
        let definition = self.definition(&config)?;

        info!(
            "Running activity '{}' from {} (store {})",
            self.args.id,
            config_path.display(),
            store_path.display()
        );

        let handle = ActivityWorker::open(store_path, self.args.id.clone(), definition)?
            .with_options(options)
            .start()?;

        let watched = if self.args.watch {
            self.watch(&handle, &config, options.poll_interval)
        } else {
            Ok(())
        };

        let phase = handle.join();
        watched?;

        let outcome = match phase {
            WorkerPhase::Finished => "finished",
            WorkerPhase::Stopped => "stopped",
            _ => "failed",
        };
        writeln!(out, "Activity '{}' {}", self.args.id, outcome)?;

        if phase == WorkerPhase::Finished {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActivityStore, YamlStore};
    use std::fs;
    use tempfile::TempDir;

    fn args(id: &str) -> RunArgs {
        RunArgs {
            config: PathBuf::from("activity.yml"),
            id: id.to_string(),
            external_id: None,
            watch: false,
            poll_interval_ms: Some(10),
        }
    }

    fn write_config(dir: &Path, steps: &[(&str, &str)]) {
        let mut yaml = String::from("activity_name: cli_test\nsteps:\n");
        for (name, command) in steps {
            yaml.push_str(&format!("  - name: {}\n    command: \"{}\"\n", name, command));
        }
        fs::write(dir.join("activity.yml"), yaml).unwrap();
    }

    #[test]
    fn runs_activity_to_completion() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), &[("touch", "touch made.txt"), ("exit", "true")]);

        let cmd = RunCommand::new(temp.path(), None, args("run-unit-1"));
        let mut out = Vec::new();
        let result = cmd.execute(&mut out).unwrap();

        assert!(result.success);
        assert!(temp.path().join("made.txt").exists());
        assert!(String::from_utf8(out).unwrap().contains("finished"));

        let store = YamlStore::open(temp.path().join(YamlStore::DEFAULT_PATH));
        let row = store.fetch("run-unit-1").unwrap().unwrap();
        assert_eq!(row.activity_name, "cli_test");
        assert_eq!(row.current_state.as_deref(), Some("exit"));
        assert!(row.is_finished);
    }

    #[test]
    fn failing_step_exits_with_one() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), &[("ok", "true"), ("boom", "exit 4"), ("exit", "true")]);

        let cmd = RunCommand::new(temp.path(), None, args("run-unit-2"));
        let mut out = Vec::new();
        let result = cmd.execute(&mut out).unwrap();

        assert_eq!(result.exit_code, 1);
        let store = YamlStore::open(temp.path().join(YamlStore::DEFAULT_PATH));
        let row = store.fetch("run-unit-2").unwrap().unwrap();
        assert_eq!(row.current_state.as_deref(), Some("ok"));
        assert!(!row.is_finished);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("activity.yml"), "activity_name: x\nsteps: []\n").unwrap();

        let cmd = RunCommand::new(temp.path(), None, args("run-unit-3"));
        let err = cmd.execute(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, StepwiseError::ConfigValidationError { .. }));
    }

    #[test]
    fn external_id_flag_wins_over_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("activity.yml"),
            "activity_name: x\nexternal_id: from-file\nsteps:\n  - name: exit\n    command: \"true\"\n",
        )
        .unwrap();

        let mut run_args = args("run-unit-4");
        run_args.external_id = Some("from-flag".to_string());
        let store_path = temp.path().join("rows.yml");
        let cmd = RunCommand::new(temp.path(), Some(store_path.clone()), run_args);
        assert!(cmd.execute(&mut Vec::new()).unwrap().success);

        let row = YamlStore::open(store_path).fetch("run-unit-4").unwrap().unwrap();
        assert_eq!(row.external_id.as_deref(), Some("from-flag"));
    }
}
