//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// stepwise - Run declarative step pipelines and composable workflows.
#[derive(Debug, Parser)]
#[command(name = "stepwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .stepwise/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one or more workflows
    Run(RunArgs),

    /// Run a single step of a registered type
    Step(StepArgs),

    /// List workflows and step types
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where a command's JSON input comes from.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InputArgs {
    /// Input as inline JSON
    #[arg(short, long, value_name = "JSON", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read input JSON from a file
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Workflows to run, in order
    #[arg(required = true, value_name = "WORKFLOW")]
    pub workflows: Vec<String>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Run all workflows concurrently with the same input
    #[arg(long)]
    pub parallel: bool,

    /// Extra run metadata as KEY=VALUE (repeatable)
    #[arg(short, long = "meta", value_name = "KEY=VALUE")]
    pub metadata: Vec<String>,
}

/// Arguments for the `step` command.
#[derive(Debug, Clone, clap::Args)]
pub struct StepArgs {
    /// Step type (e.g. shell, http, file.read)
    #[arg(value_name = "TYPE")]
    pub step_type: String,

    /// Step parameters as inline JSON
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,

    #[command(flatten)]
    pub input: InputArgs,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// List only workflows
    #[arg(long, conflicts_with = "types_only")]
    pub workflows_only: bool,

    /// List only step types
    #[arg(long)]
    pub types_only: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
