//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use ingestion::EventInput;
use std::path::PathBuf;

/// SplitNest Notifier - push notifications for expense approvals
#[derive(Parser, Debug)]
#[command(
    name = "splitnest-notifier",
    author,
    version,
    about = "Push-notification fan-out for SplitNest expense approvals",
    long_about = "Reads expense record changes, resolves the owning group's members and \n\
                  their registered devices, and sends one push notification per change."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SPLITNEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SPLITNEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch notifications for a stream of change events
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Show how a received push payload would be displayed
    Render(RenderArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "notifier.toml",
        env = "SPLITNEST_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines change events (`-` for stdin)
    #[arg(short, long, default_value = "-", env = "SPLITNEST_EVENTS")]
    pub events: EventInput,

    /// Override the document store project id
    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    pub store_project: Option<String>,

    /// Override the push transport project id
    #[arg(long, env = "FCM_PROJECT_ID")]
    pub transport_project: Option<String>,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many events (0 = until end of input)
    #[arg(long, default_value = "0", env = "SPLITNEST_MAX_EVENTS")]
    pub max_events: u64,

    /// Override dispatch.max_concurrent_events
    #[arg(long, env = "SPLITNEST_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SPLITNEST_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "notifier.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "notifier.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `render` command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Push payload JSON file (`-` for stdin)
    #[arg(short, long, default_value = "-")]
    pub payload: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
