//! Dispatch counters for the end-of-run summary

use std::sync::atomic::{AtomicU64, Ordering};

use crate::outcome::DispatchOutcome;

/// In-process dispatch counters
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    events: AtomicU64,
    filtered: AtomicU64,
    empty_audience: AtomicU64,
    no_tokens: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    tokens_succeeded: AtomicU64,
    tokens_failed: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a handled event by its outcome
    pub fn record_outcome(&self, outcome: &DispatchOutcome) {
        self.events.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            DispatchOutcome::Filtered(_) => &self.filtered,
            DispatchOutcome::EmptyAudience => &self.empty_audience,
            DispatchOutcome::NoTokens => &self.no_tokens,
            DispatchOutcome::Delivered(report) => {
                self.tokens_succeeded
                    .fetch_add(report.success_count() as u64, Ordering::Relaxed);
                self.tokens_failed
                    .fetch_add(report.failure_count() as u64, Ordering::Relaxed);
                &self.delivered
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an event that failed
    pub fn record_failure(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events: self.events.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            empty_audience: self.empty_audience.load(Ordering::Relaxed),
            no_tokens: self.no_tokens.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            tokens_succeeded: self.tokens_succeeded.load(Ordering::Relaxed),
            tokens_failed: self.tokens_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events: u64,
    pub filtered: u64,
    pub empty_audience: u64,
    pub no_tokens: u64,
    pub delivered: u64,
    pub failed: u64,
    pub tokens_succeeded: u64,
    pub tokens_failed: u64,
}
