//! Integration tests for the stepwise binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ACTIVITY: &str = r#"
activity_name: mess_around_a_bit
settings:
  poll_interval_ms: 20
steps:
  - name: read_file
    command: echo one >> trace.txt
  - name: apply_regex
    command: echo two >> trace.txt
  - name: exit
    command: echo three >> trace.txt
"#;

fn setup(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("activity.yml"), config).unwrap();
    temp
}

fn stepwise(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.current_dir(temp.path());
    cmd
}

#[test]
fn run_finishes_activity() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity '001' finished"));

    let trace = fs::read_to_string(temp.path().join("trace.txt"))?;
    assert_eq!(trace.lines().collect::<Vec<_>>(), ["one", "two", "three"]);
    assert!(temp.path().join(".stepwise/activities.yml").exists());
    Ok(())
}

#[test]
fn rerun_of_finished_activity_runs_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "001"])
        .assert()
        .success();
    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "001"])
        .assert()
        .success();

    let trace = fs::read_to_string(temp.path().join("trace.txt"))?;
    assert_eq!(trace.lines().count(), 3);
    Ok(())
}

#[test]
fn failed_run_resumes_after_fix() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup(
        r#"
activity_name: flaky
steps:
  - name: first
    command: echo first >> trace.txt
  - name: needs_flag
    command: test -f flag && echo second >> trace.txt
  - name: exit
    command: echo done >> trace.txt
"#,
    );

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "flaky"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed"));

    fs::write(temp.path().join("flag"), "")?;

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "flaky"])
        .assert()
        .success();

    let trace = fs::read_to_string(temp.path().join("trace.txt"))?;
    assert_eq!(trace.lines().collect::<Vec<_>>(), ["first", "second", "done"]);
    Ok(())
}

#[test]
fn status_prints_persisted_row() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "001", "--external-id", "ticket-3"])
        .assert()
        .success();

    stepwise(&temp)
        .args(["status", "--id", "001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mess_around_a_bit"))
        .stdout(predicate::str::contains("exit"))
        .stdout(predicate::str::contains("Finished:  yes"))
        .stdout(predicate::str::contains("ticket-3"));

    stepwise(&temp)
        .args(["status", "--id", "001", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"is_finished\": true"));
    Ok(())
}

#[test]
fn status_of_unknown_activity_fails() {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["status", "--id", "nope"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("No activity 'nope'"));
}

#[test]
fn list_uses_store_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["--store", "rows.yml", "run", "activity.yml", "--id", "a"])
        .assert()
        .success();
    stepwise(&temp)
        .args(["--store", "rows.yml", "run", "activity.yml", "--id", "b"])
        .assert()
        .success();

    assert!(temp.path().join("rows.yml").exists());
    assert!(!temp.path().join(".stepwise").exists());

    stepwise(&temp)
        .args(["list", "--store", "rows.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a "))
        .stdout(predicate::str::contains("b "));
    Ok(())
}

#[test]
fn missing_config_is_reported() {
    let temp = TempDir::new().unwrap();

    stepwise(&temp)
        .args(["run", "absent.yml", "--id", "001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

#[test]
fn invalid_config_is_reported() {
    let temp = setup("activity_name: broken\nsteps:\n  - name: a\n    command: ''\n");

    stepwise(&temp)
        .args(["run", "activity.yml", "--id", "001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn run_requires_id() {
    let temp = setup(ACTIVITY);

    stepwise(&temp)
        .args(["run", "activity.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id"));
}
