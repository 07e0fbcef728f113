//! EventRunner - service loop from event channel to dispatcher
//!
//! Each event runs in its own task; a semaphore bounds how many are in
//! flight. Reading stops when the channel closes, then in-flight events are
//! drained.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use contracts::{ChangeEvent, DispatchConfig, DocumentStore, PushTransport, TxRef};

use crate::dispatcher::FanoutDispatcher;
use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::outcome::DispatchOutcome;

/// Runner limits
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Events handled at the same time
    pub max_concurrent_events: usize,
    /// Deadline per event (None = unbounded)
    pub event_timeout: Option<Duration>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_events: 32,
            event_timeout: None,
        }
    }
}

impl From<&DispatchConfig> for RunnerSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_concurrent_events: config.max_concurrent_events,
            event_timeout: (config.event_timeout_ms > 0)
                .then(|| Duration::from_millis(config.event_timeout_ms)),
        }
    }
}

/// What happened to one event, handed to the observer
#[derive(Debug)]
pub struct EventReport {
    /// "created" or "updated"
    pub kind: &'static str,
    /// Changed document
    pub tx_ref: TxRef,
    /// Time spent handling the event
    pub elapsed: Duration,
    /// Outcome or failure
    pub result: Result<DispatchOutcome, DispatcherError>,
}

impl EventReport {
    /// Outcome label, or the error label on failure
    pub fn label(&self) -> &'static str {
        match &self.result {
            Ok(outcome) => outcome.label(),
            Err(e) => e.label(),
        }
    }
}

/// Event whose task has not been reaped yet
struct InFlight {
    kind: &'static str,
    tx_ref: TxRef,
    started: Instant,
}

/// Callback invoked after every event
pub type EventObserver = Arc<dyn Fn(&EventReport) + Send + Sync>;

/// Drives a `FanoutDispatcher` from an event channel
pub struct EventRunner<S, T> {
    dispatcher: Arc<FanoutDispatcher<S, T>>,
    settings: RunnerSettings,
    metrics: Arc<DispatchMetrics>,
    observer: Option<EventObserver>,
}

impl<S, T> EventRunner<S, T>
where
    S: DocumentStore + Send + Sync + 'static,
    T: PushTransport + Send + Sync + 'static,
{
    /// Create a runner
    pub fn new(dispatcher: Arc<FanoutDispatcher<S, T>>, settings: RunnerSettings) -> Self {
        Self {
            dispatcher,
            settings,
            metrics: Arc::new(DispatchMetrics::new()),
            observer: None,
        }
    }

    /// Call `observer` after every event
    pub fn with_observer(mut self, observer: impl Fn(&EventReport) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    /// Handle events until `rx` closes and every started event finishes
    #[instrument(
        name = "runner_run",
        skip(self, rx),
        fields(max_concurrent = self.settings.max_concurrent_events)
    )]
    pub async fn run(&self, rx: Receiver<ChangeEvent>) -> MetricsSnapshot {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_events.max(1)));
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<Id, InFlight> = HashMap::new();
        let mut received: u64 = 0;

        info!("Event runner started");

        while let Ok(event) = rx.recv().await {
            received += 1;

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let dispatcher = self.dispatcher.clone();
            let metrics = self.metrics.clone();
            let observer = self.observer.clone();
            let timeout = self.settings.event_timeout;
            let task = InFlight {
                kind: event.kind_label(),
                tx_ref: event.tx_ref().clone(),
                started: Instant::now(),
            };

            let handle = tasks.spawn(async move {
                let _permit = permit;
                process_event(&dispatcher, event, timeout, &metrics, observer.as_deref()).await;
            });
            in_flight.insert(handle.id(), task);

            while let Some(joined) = tasks.try_join_next_with_id() {
                self.reap(joined, &mut in_flight);
            }
            if received.is_multiple_of(100) {
                debug!(events = received, "Runner progress");
            }
        }

        debug!(in_flight = tasks.len(), "Input closed, draining events");
        while let Some(joined) = tasks.join_next_with_id().await {
            self.reap(joined, &mut in_flight);
        }

        let snapshot = self.metrics.snapshot();
        info!(
            events = snapshot.events,
            delivered = snapshot.delivered,
            filtered = snapshot.filtered,
            failed = snapshot.failed,
            "Event runner finished"
        );
        snapshot
    }

    /// Spawn the runner as a background task
    pub fn spawn(self, rx: Receiver<ChangeEvent>) -> JoinHandle<MetricsSnapshot> {
        tokio::spawn(async move { self.run(rx).await })
    }

    /// Forget a finished task; a panicked or cancelled one is reported as
    /// a failed event.
    fn reap(&self, joined: Result<(Id, ()), JoinError>, in_flight: &mut HashMap<Id, InFlight>) {
        let id = match &joined {
            Ok((id, ())) => *id,
            Err(e) => e.id(),
        };
        let Some(task) = in_flight.remove(&id) else {
            return;
        };
        let Err(e) = joined else {
            return;
        };

        error!(path = %task.tx_ref, kind = task.kind, error = %e, "Event task aborted");
        self.metrics.record_failure();

        let report = EventReport {
            kind: task.kind,
            elapsed: task.started.elapsed(),
            result: Err(DispatcherError::TaskAborted {
                path: task.tx_ref.path(),
                message: e.to_string(),
            }),
            tx_ref: task.tx_ref,
        };
        if let Some(observer) = &self.observer {
            observer(&report);
        }
    }
}

async fn process_event<S, T>(
    dispatcher: &FanoutDispatcher<S, T>,
    event: ChangeEvent,
    timeout: Option<Duration>,
    metrics: &DispatchMetrics,
    observer: Option<&(dyn Fn(&EventReport) + Send + Sync)>,
) where
    S: DocumentStore + Sync,
    T: PushTransport + Sync,
{
    let start = Instant::now();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, dispatcher.handle_event(&event))
            .await
            .unwrap_or_else(|_| {
                Err(DispatcherError::Deadline {
                    path: event.tx_ref().path(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }),
        None => dispatcher.handle_event(&event).await,
    };

    let report = EventReport {
        kind: event.kind_label(),
        tx_ref: event.tx_ref().clone(),
        elapsed: start.elapsed(),
        result,
    };

    match &report.result {
        Ok(outcome) => {
            metrics.record_outcome(outcome);
            debug!(path = %report.tx_ref, outcome = outcome.label(), "Event handled");
        }
        Err(e) => {
            metrics.record_failure();
            warn!(path = %report.tx_ref, kind = report.kind, error = %e, "Event failed");
        }
    }

    if let Some(observer) = observer {
        observer(&report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatcherSettings;
    use crate::transports::RecordingTransport;
    use contracts::{ContractError, Group, MulticastReport, PushMessage, TxRecord, TxStatus};
    use doc_store::{MemoryConfig, MemoryStore, StoreSnapshot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn created(tx_id: &str) -> ChangeEvent {
        ChangeEvent::Created {
            path: TxRef::new("house", tx_id),
            record: TxRecord::new("expense", TxStatus::Pending),
        }
    }

    fn slow_store(latency_ms: u64) -> MemoryStore {
        let config = MemoryConfig {
            latency: Some(Duration::from_millis(latency_ms)),
            ..Default::default()
        };
        let store = MemoryStore::with_snapshot(StoreSnapshot::default(), config);
        store.insert_group("house", Group::new(["alice"]));
        store.insert_tokens("alice", ["a1"]);
        store
    }

    #[tokio::test]
    async fn test_runs_every_event_and_reports() {
        let dispatcher = Arc::new(FanoutDispatcher::new(
            slow_store(1),
            RecordingTransport::new(),
            DispatcherSettings::default(),
        ));
        let observed = Arc::new(AtomicUsize::new(0));
        let seen = observed.clone();
        let runner = EventRunner::new(dispatcher.clone(), RunnerSettings::default())
            .with_observer(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        let (tx, rx) = async_channel::bounded(8);
        for i in 0..5 {
            tx.send(created(&format!("t{i}"))).await.unwrap();
        }
        tx.send(ChangeEvent::Created {
            path: TxRef::new("house", "income"),
            record: TxRecord::new("income", TxStatus::Pending),
        })
        .await
        .unwrap();
        drop(tx);

        let snapshot = runner.run(rx).await;
        assert_eq!(snapshot.events, 6);
        assert_eq!(snapshot.delivered, 5);
        assert_eq!(snapshot.filtered, 1);
        assert_eq!(snapshot.tokens_succeeded, 5);
        assert_eq!(observed.load(Ordering::SeqCst), 6);
        assert_eq!(dispatcher.transport().messages().len(), 5);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dispatcher = Arc::new(FanoutDispatcher::new(
            slow_store(20),
            RecordingTransport::new(),
            DispatcherSettings::default(),
        ));
        let settings = RunnerSettings {
            max_concurrent_events: 2,
            event_timeout: None,
        };
        let runner = EventRunner::new(dispatcher.clone(), settings);

        let (tx, rx) = async_channel::bounded(16);
        for i in 0..6 {
            tx.send(created(&format!("t{i}"))).await.unwrap();
        }
        drop(tx);

        let snapshot = runner.spawn(rx).await.unwrap();
        assert_eq!(snapshot.delivered, 6);
        assert!(dispatcher.store().max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_deadline_fails_event_only() {
        let dispatcher = Arc::new(FanoutDispatcher::new(
            slow_store(1),
            RecordingTransport::new().with_latency(Duration::from_millis(200)),
            DispatcherSettings::default(),
        ));
        let settings = RunnerSettings {
            max_concurrent_events: 4,
            event_timeout: Some(Duration::from_millis(20)),
        };
        let labels = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = labels.clone();
        let runner = EventRunner::new(dispatcher, settings).with_observer(move |report| {
            sink.lock().unwrap().push(report.label());
        });

        let (tx, rx) = async_channel::bounded(4);
        tx.send(created("slow")).await.unwrap();
        tx.send(ChangeEvent::Updated {
            path: TxRef::new("house", "same"),
            before: TxRecord::new("expense", TxStatus::Approved),
            after: TxRecord::new("expense", TxStatus::Approved),
        })
        .await
        .unwrap();
        drop(tx);

        let snapshot = runner.run(rx).await;
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.filtered, 1);
        let mut labels = labels.lock().unwrap().clone();
        labels.sort();
        assert_eq!(labels, vec!["deadline", "filtered"]);
    }

    struct PanickingTransport;

    impl PushTransport for PanickingTransport {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn send_multicast(&self, _message: &PushMessage) -> Result<MulticastReport, ContractError> {
            panic!("transport blew up");
        }
    }

    #[tokio::test]
    async fn test_panicked_event_reaches_observer() {
        let dispatcher = Arc::new(FanoutDispatcher::new(
            slow_store(1),
            PanickingTransport,
            DispatcherSettings::default(),
        ));
        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reports.clone();
        let runner = EventRunner::new(dispatcher, RunnerSettings::default()).with_observer(
            move |report| {
                sink.lock()
                    .unwrap()
                    .push((report.label(), report.kind, report.tx_ref.path()));
            },
        );

        let (tx, rx) = async_channel::bounded(4);
        tx.send(created("boom")).await.unwrap();
        drop(tx);

        let snapshot = runner.run(rx).await;
        assert_eq!(snapshot.failed, 1);
        assert_eq!(
            *reports.lock().unwrap(),
            vec![("aborted", "created", "groups/house/tx/boom".to_string())]
        );
    }

    #[test]
    fn test_settings_from_config() {
        let config = DispatchConfig {
            max_concurrent_events: 3,
            channel_capacity: 10,
            event_timeout_ms: 0,
        };
        let settings = RunnerSettings::from(&config);
        assert_eq!(settings.max_concurrent_events, 3);
        assert!(settings.event_timeout.is_none());
    }
}
