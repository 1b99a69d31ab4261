//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::derive::DeriveCommands;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::label::LabelCommands;
use crate::cli::commands::workflow::WorkflowCommands;

#[derive(Parser, Debug)]
#[command(name = "tagflow")]
#[command(version, about = "Labels and review workflows for any entity", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project directory (defaults to searching upward from the current directory)
    #[arg(long, short = 'C', global = true, env = "TAGFLOW_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a tagflow project in the current directory
    Init(InitArgs),

    /// Attach, detach and list labels on entities
    #[command(subcommand)]
    Label(LabelCommands),

    /// Review and progress workflows
    #[command(subcommand, name = "wf")]
    Workflow(WorkflowCommands),

    /// Display helpers for colours, durations and percentiles
    #[command(subcommand)]
    Derive(DeriveCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    /// Aligned table
    Tsv,
    Json,
    Yaml,
    Csv,
    /// Record ids only, one per line
    Id,
}
