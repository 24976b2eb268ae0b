// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Periodic removal of idle clients.
//!
//! Lazy pruning already keeps every window correct. The sweeper only bounds
//! memory when many clients go quiet and are never seen again.

use crate::clock::Clock;
use crate::error::{ConfigError, Result};
use crate::limiter::SlidingWindowLimiter;
use crate::metrics::LimiterMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handle to a running sweep task. Dropping it stops the task.
pub struct Sweeper {
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a task calling [`SlidingWindowLimiter::purge_idle`] every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C>(
        limiter: Arc<SlidingWindowLimiter<C>>,
        interval: Duration,
        metrics: Option<LimiterMetrics>,
    ) -> Result<Self>
    where
        C: Clock + 'static,
    {
        if interval.is_zero() {
            return Err(ConfigError::InvalidSweepInterval);
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; nothing to sweep yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.purge_idle();
                let tracked = limiter.tracked_clients();
                if let Some(metrics) = &metrics {
                    metrics.record_sweep(removed);
                    metrics.set_tracked_clients(tracked);
                }
                if removed > 0 {
                    info!(removed, tracked, "Swept idle clients");
                } else {
                    debug!(tracked, "Sweep found no idle clients");
                }
            }
        });

        Ok(Self {
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the sweep task and wait for it to wind down.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
