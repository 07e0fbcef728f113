//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::ChangeEvent;
use tokio::io::AsyncBufRead;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::{IngestionConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::source::{forward_events, EventInput};

/// Ingestion Pipeline
///
/// Reads change events from one or more inputs into a single bounded
/// channel. Readers wait when the channel is full, so a slow dispatcher
/// slows reading instead of dropping events.
pub struct IngestionPipeline {
    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Event sender (shared by all readers)
    tx: Option<Sender<ChangeEvent>>,

    /// Event receiver
    rx: Option<Receiver<ChangeEvent>>,

    /// Running reader tasks
    readers: Vec<(String, JoinHandle<Result<u64>>)>,

    config: IngestionConfig,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(IngestionConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    /// Create with custom configuration
    pub fn with_config(config: IngestionConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            metrics: Arc::new(IngestionMetrics::new()),
            tx: Some(tx),
            rx: Some(rx),
            readers: Vec::new(),
            config,
        }
    }

    /// Open `input` and start reading it
    #[instrument(name = "ingestion_start_input", skip(self), fields(input = %input))]
    pub async fn start_input(&mut self, input: &EventInput) -> Result<()> {
        let reader = input.open().await?;
        self.start_reader(input.to_string(), reader)
    }

    /// Start reading events from any line reader
    pub fn start_reader<R>(&mut self, name: impl Into<String>, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let name = name.into();
        let tx = self.tx.clone().ok_or(IngestionError::ChannelClosed)?;
        let metrics = self.metrics.clone();
        let max_events = self.config.max_events;

        debug!(source = %name, "starting event reader");
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            forward_events(&task_name, reader, tx, metrics, max_events).await
        });
        self.readers.push((name, handle));
        Ok(())
    }

    /// Get event stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<ChangeEvent>> {
        self.rx.take()
    }

    /// Stop accepting new readers
    ///
    /// The receiver sees end of stream once every started reader finishes.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Wait for all readers and return the total forwarded
    ///
    /// Read failures are logged; a closed receiver is treated as a normal stop.
    #[instrument(name = "ingestion_join", skip(self))]
    pub async fn join(&mut self) -> u64 {
        self.close();
        let mut total = 0;
        for (name, handle) in self.readers.drain(..) {
            match handle.await {
                Ok(Ok(count)) => total += count,
                Ok(Err(IngestionError::ChannelClosed)) => {
                    debug!(source = %name, "reader stopped by closed channel")
                }
                Ok(Err(e)) => warn!(source = %name, error = %e, "reader failed"),
                Err(e) => warn!(source = %name, error = %e, "reader task panicked"),
            }
        }
        info!(forwarded = total, "all event readers finished");
        total
    }

    /// Abort all readers
    pub fn stop_all(&mut self) {
        self.close();
        for (name, handle) in self.readers.drain(..) {
            debug!(source = %name, "stopping reader");
            handle.abort();
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
