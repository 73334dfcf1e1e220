//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stepwise - Resumable step-by-step activities.
#[derive(Debug, Parser)]
#[command(name = "stepwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the activity row store (overrides the activity file setting)
    #[arg(short, long, global = true, env = "STEPWISE_STORE")]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an activity file, resuming from its persisted progress
    Run(RunArgs),

    /// Show the persisted row of one activity
    Status(StatusArgs),

    /// List every persisted activity
    List(ListArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Activity file to run
    pub config: PathBuf,

    /// Activity identifier (row key)
    #[arg(long)]
    pub id: String,

    /// Correlation id to store with the activity
    #[arg(long)]
    pub external_id: Option<String>,

    /// Keep watching the activity file for appended steps
    #[arg(short, long)]
    pub watch: bool,

    /// Idle poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Activity identifier
    #[arg(long)]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
