// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client Rate Limiter
//!
//! This crate provides a sliding-window rate limiter keyed by client
//! identifier, plus the HTTP service that fronts it:
//!
//! - Per-client limit of `max_requests` inside a trailing `time_window`
//! - Lazy pruning of expired admissions on every check
//! - Optional background sweep of idle clients
//! - `429 Too Many Requests` middleware with `Retry-After`
//! - Prometheus counters for admitted and rejected requests

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, ServiceError};
pub use limiter::{RateLimitDecision, SlidingWindowLimiter};
pub use sweeper::Sweeper;
