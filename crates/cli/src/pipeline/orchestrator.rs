//! Pipeline orchestrator - wires source, store, transport and runner.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{DocumentStore, NotifierConfig, PushTransport};
use dispatcher::{
    AnyTransport, DispatcherSettings, EventReport, EventRunner, FanoutDispatcher, RunnerSettings,
};
use doc_store::AnyStore;
use ingestion::{EventInput, IngestionConfig, IngestionPipeline};
use observability::{
    record_dispatch_latency_ms, record_event_outcome, record_parse_errors, record_queue_depth,
    record_tokens, DispatchAggregator,
};
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded and validated service configuration
    pub notifier: NotifierConfig,

    /// Where change events come from
    pub events: EventInput,

    /// Log messages instead of sending them
    pub dry_run: bool,

    /// Maximum number of events to read (None = until end of input)
    pub max_events: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run with the configured store and transport
    ///
    /// Returns once the input is exhausted, or after `shutdown` resolves and
    /// in-flight events have drained.
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let store = AnyStore::from_config(&self.config.notifier.store)
            .context("Failed to create document store")?;
        let transport = AnyTransport::from_config(&self.config.notifier.transport, self.config.dry_run)
            .context("Failed to create push transport")?;

        info!(
            store = store.kind(),
            transport = transport.name(),
            "Backends ready"
        );

        self.run_with(store, transport, shutdown).await
    }

    /// Run with explicit backends
    pub async fn run_with<S, T, F>(self, store: S, transport: T, shutdown: F) -> Result<PipelineStats>
    where
        S: DocumentStore + Send + Sync + 'static,
        T: PushTransport + Send + Sync + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let notifier = &self.config.notifier;

        let mut ingestion = IngestionPipeline::with_config(IngestionConfig::new(
            notifier.dispatch.channel_capacity,
            self.config.max_events,
        ));
        let rx = ingestion
            .take_receiver()
            .ok_or_else(|| CliError::pipeline_execution("event receiver already taken"))?;
        ingestion
            .start_input(&self.config.events)
            .await
            .with_context(|| format!("Failed to open event input {}", self.config.events))?;
        ingestion.close();

        let dispatcher = Arc::new(FanoutDispatcher::new(
            store,
            transport,
            DispatcherSettings::from(&notifier.app),
        ));

        let aggregator = Arc::new(Mutex::new(DispatchAggregator::new()));
        let queue = rx.clone();
        let sink = aggregator.clone();
        let runner = EventRunner::new(dispatcher, RunnerSettings::from(&notifier.dispatch))
            .with_observer(move |report: &EventReport| {
                let latency_ms = report.elapsed.as_secs_f64() * 1000.0;
                let multicast = report.result.as_ref().ok().and_then(|o| o.report());

                record_event_outcome(report.kind, report.label());
                record_dispatch_latency_ms(latency_ms);
                record_queue_depth(queue.len());
                if let Some(multicast) = multicast {
                    record_tokens(multicast);
                }

                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record_event(report.label(), latency_ms, multicast);
            });

        info!(
            input = %self.config.events,
            max_concurrent = notifier.dispatch.max_concurrent_events,
            "Pipeline started"
        );

        let mut run_handle = runner.spawn(rx);
        tokio::pin!(shutdown);

        let mut interrupted = false;
        let joined = tokio::select! {
            joined = &mut run_handle => joined,
            _ = &mut shutdown => {
                warn!("Received shutdown signal, draining in-flight events...");
                interrupted = true;
                ingestion.stop_all();
                run_handle.await
            }
        };
        let dispatch = joined.map_err(|e| CliError::pipeline_execution(e.to_string()))?;

        ingestion.join().await;
        let ingested = ingestion.metrics().snapshot();
        record_parse_errors(ingested.parse_errors);

        let summary = aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary();

        Ok(PipelineStats {
            lines_read: ingested.lines_read,
            events_forwarded: ingested.events_forwarded,
            parse_errors: ingested.parse_errors,
            dispatch,
            summary,
            duration: start_time.elapsed(),
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Group;
    use dispatcher::RecordingTransport;
    use doc_store::MemoryStore;
    use std::io::Write;

    fn config_for(path: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            notifier: NotifierConfig::default(),
            events: EventInput::File(path.to_path_buf()),
            dry_run: true,
            max_events: None,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_run_with_memory_backends() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"kind":"created","path":"groups/house/tx/t1","record":{{"type":"expense","status":"pending","category":"food","amount":12}}}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            r#"{{"kind":"created","path":"groups/house/tx/t2","record":{{"type":"income","status":"pending"}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let store = MemoryStore::new();
        store.insert_group("house", Group::new(["alice"]));
        store.insert_tokens("alice", ["tok-a"]);

        let stats = Pipeline::new(config_for(file.path()))
            .run_with(store, RecordingTransport::new(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.events_forwarded, 2);
        assert_eq!(stats.dispatch.events, 2);
        assert_eq!(stats.dispatch.delivered, 1);
        assert_eq!(stats.dispatch.filtered, 1);
        assert_eq!(stats.summary.tokens_succeeded, 1);
        assert!(!stats.interrupted);
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let result = Pipeline::new(config_for(std::path::Path::new("/nonexistent/events.jsonl")))
            .run_with(MemoryStore::new(), RecordingTransport::new(), std::future::pending())
            .await;
        assert!(result.is_err());
    }
}
