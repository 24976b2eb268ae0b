// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for load simulation results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects metrics during a load run.
#[derive(Debug, Default)]
pub struct LoadMetrics {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Admitted requests by client
    admitted_per_client: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Admitted,
    Rejected,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, client: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        if outcome == Outcome::Admitted {
            *self
                .admitted_per_client
                .entry(client.to_string())
                .or_insert(0) += 1;
        }
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Fold another collector (e.g. one worker's) into this one.
    pub fn merge(&mut self, other: LoadMetrics) {
        for (outcome, count) in other.outcomes {
            *self.outcomes.entry(outcome).or_insert(0) += count;
        }
        for (client, count) in other.admitted_per_client {
            *self.admitted_per_client.entry(client).or_insert(0) += count;
        }
        self.latencies.extend(other.latencies);
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Admitted requests for one client.
    pub fn admitted_for(&self, client: &str) -> usize {
        self.admitted_per_client.get(client).copied().unwrap_or(0)
    }

    /// Largest number of admissions any single client received.
    pub fn max_admitted_per_client(&self) -> usize {
        self.admitted_per_client.values().copied().max().unwrap_or(0)
    }

    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Ratio of admitted to total requests.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.count(Outcome::Admitted) as f64 / total as f64
    }

    pub fn p99_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn report(&self) -> LoadReport {
        LoadReport {
            total_requests: self.total_requests(),
            admitted: self.count(Outcome::Admitted),
            rejected: self.count(Outcome::Rejected),
            duration_ms: self.duration().as_millis() as u64,
            success_rate: self.success_rate(),
            p99_latency_us: self.p99_latency_us(),
            clients_admitted: self.admitted_per_client.len(),
        }
    }
}

/// Summary report of a load run.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_requests: usize,
    pub admitted: usize,
    pub rejected: usize,
    pub duration_ms: u64,
    pub success_rate: f64,
    pub p99_latency_us: u64,
    pub clients_admitted: usize,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Load Report ===")?;
        writeln!(f, "Duration:          {} ms", self.duration_ms)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Admitted:          {}", self.admitted)?;
        writeln!(f, "Rejected:          {}", self.rejected)?;
        writeln!(f, "Success Rate:      {:.1}%", self.success_rate * 100.0)?;
        writeln!(f, "P99 Latency:       {} us", self.p99_latency_us)?;
        writeln!(f, "Clients Admitted:  {}", self.clients_admitted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_combines_workers() {
        let mut a = LoadMetrics::new();
        a.record(Outcome::Admitted, "client-0", Duration::from_micros(10));
        let mut b = LoadMetrics::new();
        b.record(Outcome::Admitted, "client-0", Duration::from_micros(20));
        b.record(Outcome::Rejected, "client-0", Duration::from_micros(5));

        a.merge(b);

        assert_eq!(a.total_requests(), 3);
        assert_eq!(a.admitted_for("client-0"), 2);
        assert!((a.success_rate() - 2.0 / 3.0).abs() < 0.01);
    }
}
