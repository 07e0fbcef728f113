//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::MetricsSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Input lines read, blank lines included
    pub lines_read: u64,

    /// Events handed to the dispatcher
    pub events_forwarded: u64,

    /// Lines that did not parse as a change event
    pub parse_errors: u64,

    /// Dispatcher counters
    pub dispatch: MetricsSnapshot,

    /// Outcome, token and latency aggregates
    pub summary: MetricsSummary,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Stopped by a shutdown signal
    pub interrupted: bool,
}

impl PipelineStats {
    /// Events handled per second
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.events as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Malformed lines: {}", self.parse_errors);
        println!("   ├─ Events handled: {}", self.dispatch.events);
        println!("   ├─ Events/s: {:.2}", self.events_per_sec());
        println!(
            "   └─ Stopped by signal: {}",
            if self.interrupted { "yes" } else { "no" }
        );

        let d = &self.dispatch;
        println!("\n📨 Outcomes");
        println!("   ├─ Delivered: {}", d.delivered);
        println!("   ├─ Filtered: {}", d.filtered);
        println!("   ├─ Empty audience: {}", d.empty_audience);
        println!("   ├─ No tokens: {}", d.no_tokens);
        println!("   └─ Failed: {}", d.failed);

        println!("\n📱 Tokens");
        println!("   ├─ Accepted: {}", d.tokens_succeeded);
        println!(
            "   ├─ Rejected: {} ({:.2}%)",
            d.tokens_failed, self.summary.token_failure_rate
        );
        println!("   └─ Latency (ms): {}", self.summary.latency_ms);

        if !self.summary.token_failures.is_empty() {
            println!("\n⚠️  Rejections by code");
            let last = self.summary.token_failures.len() - 1;
            for (i, (code, count)) in self.summary.token_failures.iter().enumerate() {
                let prefix = if i == last { "└─" } else { "├─" };
                println!("   {} {}: {}", prefix, code, count);
            }
        }

        println!();
    }
}
