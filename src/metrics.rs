//! Client-side request metrics: call counts, failures, latency.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// Number of most recent latencies kept for averages and percentiles
pub const LATENCY_WINDOW: usize = 1024;

/// Collects request metrics for a client.
///
/// Counters cover every request; latency statistics cover the last
/// [`LATENCY_WINDOW`] requests.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    latencies_us: VecDeque<f64>,
    total_requests: u64,
    total_failures: u64,
    per_operation: BTreeMap<String, u64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            latencies_us: VecDeque::with_capacity(LATENCY_WINDOW),
            total_requests: 0,
            total_failures: 0,
            per_operation: BTreeMap::new(),
        }
    }

    /// Record a completed request with its duration.
    pub fn record_request(&mut self, operation: &str, duration: Duration, success: bool) {
        self.total_requests += 1;
        if !success {
            self.total_failures += 1;
        }
        *self.per_operation.entry(operation.to_string()).or_insert(0) += 1;
        if self.latencies_us.len() == LATENCY_WINDOW {
            self.latencies_us.pop_front();
        }
        self.latencies_us.push_back(duration.as_micros() as f64);
    }

    /// Number of latency samples currently held.
    pub fn latency_samples(&self) -> usize {
        self.latencies_us.len()
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Number of requests issued for `operation` (e.g. `PutVectors`).
    pub fn requests_for(&self, operation: &str) -> u64 {
        self.per_operation.get(operation).copied().unwrap_or(0)
    }

    /// Average request latency in microseconds.
    pub fn avg_latency_us(&self) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.latencies_us.iter().sum();
        sum / self.latencies_us.len() as f64
    }

    /// Get a percentile of request latency (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_latency_us(&self, percentile: f64) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.latencies_us.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
