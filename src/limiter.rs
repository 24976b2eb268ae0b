// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter keyed by client identifier.
//!
//! Every client owns a queue of admission instants. On each check the queue
//! is pruned of instants that have left the trailing window, and the request
//! is admitted only while fewer than `max_requests` remain.
//!
//! Boundary policy: an instant counts while `now - instant < window`. An
//! instant aged exactly `window` is expired.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::error::{ConfigError, Result};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is admitted and recorded
    Allowed {
        /// Requests still available in the current window
        remaining: u32,
        /// Time until the oldest counted request leaves the window
        reset_in: Duration,
    },
    /// Request is rejected and not recorded
    Limited {
        /// Time until a slot frees up
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Admission history of one client.
#[derive(Debug, Default)]
struct ClientWindow {
    /// Admission instants, oldest first
    timestamps: VecDeque<Instant>,
}

impl ClientWindow {
    /// Drop instants that are no longer inside the window ending at `now`.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn len(&self) -> u32 {
        u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX)
    }

    /// Time until the oldest retained instant expires.
    fn next_expiry(&self, now: Instant, window: Duration) -> Duration {
        self.timestamps
            .front()
            .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(Duration::ZERO)
    }
}

/// Thread-safe sliding-window rate limiter.
///
/// Windows live in a sharded map. A check holds its client's shard lock
/// while pruning, counting and recording, so concurrent checks for one
/// client are serialized and can never over-admit.
pub struct SlidingWindowLimiter<C = SystemClock> {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, ClientWindow>,
    clock: C,
}

impl SlidingWindowLimiter<SystemClock> {
    /// Create a limiter admitting `max_requests` per `window` per client.
    pub fn new(max_requests: u32, window: Duration) -> Result<Self> {
        Self::with_clock(max_requests, window, SystemClock)
    }

    /// Create a limiter from service configuration.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.max_requests, config.window_duration())
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Create a limiter reading time from `clock`.
    pub fn with_clock(max_requests: u32, window: Duration, clock: C) -> Result<Self> {
        if max_requests < 1 {
            return Err(ConfigError::InvalidMaxRequests(max_requests));
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidWindow);
        }

        Ok(Self {
            max_requests,
            window,
            windows: DashMap::new(),
            clock,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn time_window(&self) -> Duration {
        self.window
    }

    /// Admit or reject a request from `client_id`.
    pub fn is_allowed(&self, client_id: &str) -> bool {
        self.check(client_id).is_allowed()
    }

    /// Admit or reject a request from `client_id`, with quota details.
    pub fn check(&self, client_id: &str) -> RateLimitDecision {
        let now = self.clock.now();

        let decision = match self.windows.get_mut(client_id) {
            Some(mut window) => self.decide(&mut window, now),
            None => {
                let mut window = self.windows.entry(client_id.to_owned()).or_default();
                self.decide(&mut window, now)
            }
        };

        if let RateLimitDecision::Limited { retry_after } = decision {
            debug!(client_id, ?retry_after, "Client rate limit exceeded");
        }
        decision
    }

    fn decide(&self, window: &mut ClientWindow, now: Instant) -> RateLimitDecision {
        window.prune(now, self.window);

        let count = window.len();
        if count < self.max_requests {
            window.timestamps.push_back(now);
            RateLimitDecision::Allowed {
                remaining: self.max_requests - count - 1,
                reset_in: window.next_expiry(now, self.window),
            }
        } else {
            RateLimitDecision::Limited {
                retry_after: window.next_expiry(now, self.window),
            }
        }
    }

    /// Requests `client_id` could make right now. Does not record anything.
    pub fn remaining(&self, client_id: &str) -> u32 {
        let now = self.clock.now();
        match self.windows.get_mut(client_id) {
            Some(mut window) => {
                window.prune(now, self.window);
                self.max_requests.saturating_sub(window.len())
            }
            None => self.max_requests,
        }
    }

    /// Forget a client's history. Returns whether the client was tracked.
    pub fn reset(&self, client_id: &str) -> bool {
        self.windows.remove(client_id).is_some()
    }

    /// Prune every window and drop clients left with no recent requests.
    ///
    /// Returns the number of clients removed.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        self.windows.retain(|_, window| {
            window.prune(now, self.window);
            let keep = !window.timestamps.is_empty();
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Number of clients currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
