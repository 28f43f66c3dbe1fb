//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// harvestd - deterministic harvest planning for literature metadata sources
#[derive(Parser)]
#[command(
    name = "hd",
    about = "Deterministic harvest planner for literature metadata sources",
    version
)]
pub struct Cli {
    /// Path to registry config file
    #[arg(short, long, global = true, help = "Path to registry config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a plan from a normalized trigger and print the assembly
    Plan {
        /// Path to the trigger JSON file
        #[arg(value_name = "TRIGGER")]
        trigger: PathBuf,

        /// Base query expression JSON (defaults to match-everything)
        #[arg(short, long)]
        expr: Option<PathBuf>,

        /// Planning instant (RFC 3339); defaults to the trigger's triggered_at
        #[arg(long)]
        now: Option<String>,

        /// Cursor watermark (RFC 3339) to plan against
        #[arg(long)]
        watermark: Option<String>,

        /// Queued-task count reported to the backpressure check
        #[arg(long, default_value = "0")]
        queued: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List provenances known to the registry config
    Provenances,
}

/// Output format for plan results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
