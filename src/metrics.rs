// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for rate limit decisions.
//!
//! Each service instance owns its own registry, so several limiters (or
//! tests) can coexist in one process.

use crate::limiter::RateLimitDecision;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Rate limiter metrics and the registry that exposes them.
#[derive(Clone)]
pub struct LimiterMetrics {
    registry: Registry,
    admitted: IntCounter,
    rejected: IntCounter,
    tracked_clients: IntGauge,
    swept_clients: IntCounter,
}

impl LimiterMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let admitted = IntCounter::new(
            "rate_limit_admitted_total",
            "Total number of requests admitted",
        )?;
        let rejected = IntCounter::new(
            "rate_limit_rejected_total",
            "Total number of requests rejected",
        )?;
        let tracked_clients = IntGauge::new(
            "rate_limit_tracked_clients",
            "Number of clients currently holding a window",
        )?;
        let swept_clients = IntCounter::new(
            "rate_limit_swept_clients_total",
            "Total number of idle clients removed by the sweeper",
        )?;

        registry.register(Box::new(admitted.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;
        registry.register(Box::new(swept_clients.clone()))?;

        Ok(Self {
            registry,
            admitted,
            rejected,
            tracked_clients,
            swept_clients,
        })
    }

    /// Count one decision.
    pub fn record(&self, decision: &RateLimitDecision) {
        if decision.is_allowed() {
            self.admitted.inc();
        } else {
            self.rejected.inc();
        }
    }

    pub fn set_tracked_clients(&self, count: usize) {
        self.tracked_clients
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn record_sweep(&self, removed: usize) {
        self.swept_clients
            .inc_by(u64::try_from(removed).unwrap_or(u64::MAX));
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.get()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.get()
    }

    pub fn swept(&self) -> u64 {
        self.swept_clients.get()
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
