//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::NotifierConfig;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::ensure_config_exists;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    ensure_config_exists(&args.config)?;

    // Validated after overrides; a project id may come from the environment
    let mut notifier: NotifierConfig = ConfigLoader::load_document(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut notifier, args);
    ConfigLoader::validate(&notifier).context("Invalid configuration after CLI overrides")?;

    info!(
        app = %notifier.app.name,
        store = ?notifier.store.store_type,
        transport = ?notifier.transport.transport_type,
        dry_run = args.dry_run,
        max_concurrent = notifier.dispatch.max_concurrent_events,
        "Configuration loaded"
    );

    let pipeline_config = PipelineConfig {
        notifier,
        events: args.events.clone(),
        dry_run: args.dry_run,
        max_events: if args.max_events == 0 {
            None
        } else {
            Some(args.max_events)
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    let stats = pipeline
        .run(setup_shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        events = stats.dispatch.events,
        delivered = stats.dispatch.delivered,
        failed = stats.dispatch.failed,
        parse_errors = stats.parse_errors,
        duration_secs = stats.duration.as_secs_f64(),
        events_per_sec = format!("{:.2}", stats.events_per_sec()),
        "Pipeline completed"
    );

    stats.print_summary();

    info!("SplitNest notifier finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded file
fn apply_overrides(notifier: &mut NotifierConfig, args: &RunArgs) {
    if let Some(ref project) = args.store_project {
        info!(project = %project, "Overriding store project from CLI");
        notifier.store.project_id = Some(project.clone());
    }
    if let Some(ref project) = args.transport_project {
        info!(project = %project, "Overriding transport project from CLI");
        notifier.transport.project_id = Some(project.clone());
    }
    if let Some(max) = args.max_concurrent {
        info!(max_concurrent = max, "Overriding dispatch concurrency from CLI");
        notifier.dispatch.max_concurrent_events = max;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
