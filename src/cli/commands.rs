//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stacksynth - deterministic deployment-plan synthesis for declarative stacks.
#[derive(Parser, Debug)]
#[command(name = "stacksynth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the stack file.
    #[arg(short, long, global = true, env = "STACKSYNTH_STACK")]
    pub stack: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the stack definition.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Synthesize and display the deployment plan.
    Plan {
        /// Write the emitted plan document to this path.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
    },

    /// Rehearse the plan against a simulated provisioner.
    Rehearse {
        /// Maximum concurrent provisioning tasks within a batch.
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// List known resource kinds and their output attributes.
    Kinds,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}
