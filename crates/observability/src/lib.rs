//! # Observability
//!
//! Tracing initialization and Prometheus metrics.
//!
//! ## Features
//!
//! - Tracing setup (JSON / Pretty / Compact)
//! - Prometheus exporter
//! - Dispatch metrics and end-of-run summary
//!
//! ## Example
//!
//! ```ignore
//! use observability::{metrics, LoggingConfig};
//!
//! observability::init_logging(&LoggingConfig::default())?;
//!
//! metrics::record_event_outcome("created", outcome.label());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_dispatch_latency_ms, record_event_outcome, record_parse_errors, record_queue_depth,
    record_tokens, DispatchAggregator, MetricsSummary, RunningStats, StatsSummary,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log format
    pub format: LogFormat,
    /// Level used when `RUST_LOG` is unset or ignored
    pub level: String,
    /// Whether `RUST_LOG` overrides `level`
    pub respect_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            respect_env: true,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Human-readable
    Pretty,
    /// Single-line
    Compact,
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if config.respect_env {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    } else {
        EnvFilter::new(&config.level)
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr so stdout stays clean for command output.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// Initialize only the Prometheus exporter
///
/// For when tracing is set up elsewhere.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
