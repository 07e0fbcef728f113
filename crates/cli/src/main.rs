//! # SplitNest Notifier CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Event pipeline orchestration and lifecycle
//! - Graceful shutdown handling

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::{LogFormat, LoggingConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_render, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_logging(&logging_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "SplitNest notifier starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Render(args) => run_render(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Map the global CLI flags onto the logging setup
fn logging_config(cli: &Cli) -> LoggingConfig {
    let format = match cli.log_format {
        cli::LogFormat::Json => LogFormat::Json,
        cli::LogFormat::Pretty => LogFormat::Pretty,
        cli::LogFormat::Compact => LogFormat::Compact,
    };

    if cli.quiet {
        return LoggingConfig {
            format,
            level: "warn".to_string(),
            respect_env: false,
        };
    }

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    LoggingConfig {
        format,
        level: level.to_string(),
        respect_env: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_pins_warn_level() {
        let cli = Cli::parse_from(["splitnest-notifier", "-q", "--log-format", "json", "info"]);
        let config = logging_config(&cli);
        assert_eq!(config.level, "warn");
        assert!(!config.respect_env);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_verbosity_raises_level() {
        let cli = Cli::parse_from(["splitnest-notifier", "-vv", "info"]);
        let config = logging_config(&cli);
        assert_eq!(config.level, "trace");
        assert!(config.respect_env);
    }
}
