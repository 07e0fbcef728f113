//! Ingestion configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Channel capacity; readers wait when it is full
    pub channel_capacity: usize,

    /// Stop after forwarding this many events (None = until end of input)
    pub max_events: Option<u64>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            max_events: None,
        }
    }
}

impl IngestionConfig {
    /// Create new ingestion configuration
    pub fn new(channel_capacity: usize, max_events: Option<u64>) -> Self {
        Self {
            channel_capacity,
            max_events,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Non-blank lines read
    pub lines_read: AtomicU64,

    /// Events forwarded downstream
    pub events_forwarded: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,

    /// Parse error count
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-blank line
    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event forwarded downstream
    pub fn record_forwarded(&self) {
        self.events_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Events forwarded so far
    pub fn forwarded(&self) -> u64 {
        self.events_forwarded.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Non-blank lines read
    pub lines_read: u64,

    /// Events forwarded downstream
    pub events_forwarded: u64,

    /// Current queue length
    pub queue_len: usize,

    /// Parse error count
    pub parse_errors: u64,
}
