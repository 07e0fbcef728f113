//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{NotifierConfig, StoreType, TransportType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    app_name: String,
    expected_kind: String,
    store: String,
    transport: String,
    max_concurrent_events: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(notifier) => {
            let warnings = collect_warnings(&notifier);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", notifier.version),
                    app_name: notifier.app.name.clone(),
                    expected_kind: notifier.app.expected_kind.clone(),
                    store: format!("{:?}", notifier.store.store_type),
                    transport: format!("{:?}", notifier.transport.transport_type),
                    max_concurrent_events: notifier.dispatch.max_concurrent_events,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(notifier: &NotifierConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if notifier.transport.transport_type == TransportType::Log {
        warnings.push("transport is 'log' - notifications are logged, not sent".to_string());
    }

    if notifier.store.store_type == StoreType::Memory && notifier.store.snapshot_path.is_none() {
        warnings.push(
            "memory store without snapshot_path - every group will resolve empty".to_string(),
        );
    }

    if notifier.dispatch.event_timeout_ms == 0 {
        warnings.push("dispatch.event_timeout_ms is 0 - events have no deadline".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  App: {} (kind '{}')", summary.app_name, summary.expected_kind);
            println!("  Store: {}", summary.store);
            println!("  Transport: {}", summary.transport);
            println!("  Max concurrent events: {}", summary.max_concurrent_events);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
