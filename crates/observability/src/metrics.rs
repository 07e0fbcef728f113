//! Dispatch metrics
//!
//! Prometheus series recorded through the `metrics` facade, plus an
//! in-memory aggregator for the end-of-run summary.

use std::collections::BTreeMap;

use contracts::{MulticastReport, SendOutcome};
use metrics::{counter, gauge, histogram};

/// Record one handled event
///
/// `outcome` is the dispatcher's outcome or error label.
pub fn record_event_outcome(kind: &str, outcome: &str) {
    counter!(
        "splitnest_events_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record per-token delivery results of one multicast
pub fn record_tokens(report: &MulticastReport) {
    let succeeded = report.success_count() as u64;
    let failed = report.failure_count() as u64;

    if succeeded > 0 {
        counter!("splitnest_tokens_total", "status" => "success").increment(succeeded);
    }
    if failed > 0 {
        counter!("splitnest_tokens_total", "status" => "failure").increment(failed);
    }
    histogram!("splitnest_multicast_size").record(report.responses.len() as f64);
}

/// Record time spent handling one event
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("splitnest_dispatch_latency_ms").record(latency_ms);
}

/// Record events waiting between source and dispatcher
pub fn record_queue_depth(depth: usize) {
    gauge!("splitnest_event_queue_depth").set(depth as f64);
}

/// Record malformed input lines
pub fn record_parse_errors(count: u64) {
    if count > 0 {
        counter!("splitnest_event_parse_errors_total").increment(count);
    }
}

/// Dispatch metrics aggregator
///
/// Aggregates in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct DispatchAggregator {
    /// Events handled
    pub total_events: u64,

    /// Events per outcome label
    pub outcomes: BTreeMap<String, u64>,

    /// Tokens accepted by the push service
    pub tokens_succeeded: u64,

    /// Tokens rejected, by error code
    pub token_failures: BTreeMap<String, u64>,

    /// Handling latency
    pub latency_stats: RunningStats,
}

impl DispatchAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one handled event
    pub fn record_event(&mut self, outcome: &str, latency_ms: f64, report: Option<&MulticastReport>) {
        self.total_events += 1;
        *self.outcomes.entry(outcome.to_string()).or_insert(0) += 1;
        self.latency_stats.push(latency_ms);

        let Some(report) = report else {
            return;
        };
        for response in &report.responses {
            match &response.outcome {
                SendOutcome::Delivered { .. } => self.tokens_succeeded += 1,
                SendOutcome::Failed { code, .. } => {
                    *self.token_failures.entry(code.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        let tokens_failed: u64 = self.token_failures.values().sum();
        let tokens_total = self.tokens_succeeded + tokens_failed;

        MetricsSummary {
            total_events: self.total_events,
            outcomes: self.outcomes.clone(),
            tokens_succeeded: self.tokens_succeeded,
            tokens_failed,
            token_failure_rate: if tokens_total > 0 {
                tokens_failed as f64 / tokens_total as f64 * 100.0
            } else {
                0.0
            },
            token_failures: self.token_failures.clone(),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub outcomes: BTreeMap<String, u64>,
    pub tokens_succeeded: u64,
    pub tokens_failed: u64,
    pub token_failure_rate: f64,
    pub token_failures: BTreeMap<String, u64>,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        for (outcome, count) in &self.outcomes {
            writeln!(f, "  {outcome}: {count}")?;
        }
        writeln!(f, "Tokens delivered: {}", self.tokens_succeeded)?;
        writeln!(
            f,
            "Tokens rejected: {} ({:.2}%)",
            self.tokens_failed, self.token_failure_rate
        )?;
        for (code, count) in &self.token_failures {
            writeln!(f, "  {code}: {count}")?;
        }
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SendResponse;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_outcomes_and_failure_codes() {
        let mut aggregator = DispatchAggregator::new();
        let report = MulticastReport::new(vec![
            SendResponse::delivered("a", None),
            SendResponse::failed("b", "UNREGISTERED", "gone"),
            SendResponse::failed("c", "UNREGISTERED", "gone"),
        ]);

        aggregator.record_event("delivered", 12.0, Some(&report));
        aggregator.record_event("filtered", 0.5, None);

        let summary = aggregator.summary();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.outcomes.get("delivered"), Some(&1));
        assert_eq!(summary.outcomes.get("filtered"), Some(&1));
        assert_eq!(summary.tokens_succeeded, 1);
        assert_eq!(summary.tokens_failed, 2);
        assert_eq!(summary.token_failures.get("UNREGISTERED"), Some(&2));
        assert_eq!(summary.latency_ms.count, 2);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DispatchAggregator::new();
        aggregator.record_event(
            "delivered",
            10.0,
            Some(&MulticastReport::new(vec![
                SendResponse::delivered("a", None),
                SendResponse::failed("b", "INVALID_ARGUMENT", "bad"),
            ])),
        );

        let output = aggregator.summary().to_string();
        assert!(output.contains("Total events: 1"));
        assert!(output.contains("Tokens rejected: 1 (50.00%)"));
        assert!(output.contains("INVALID_ARGUMENT: 1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_event_outcome("created", "delivered");
        record_dispatch_latency_ms(3.0);
        record_queue_depth(0);
        record_parse_errors(2);
        record_tokens(&MulticastReport::default());
    }
}
