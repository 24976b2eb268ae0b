// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the client rate limiter.

use thiserror::Error;

/// Configuration errors, surfaced when a limiter or service is constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_requests must be at least 1, got {0}")]
    InvalidMaxRequests(u32),

    #[error("time window must be greater than zero")]
    InvalidWindow,

    #[error("sweep interval must be greater than zero")]
    InvalidSweepInterval,

    #[error("Invalid client id header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while assembling the HTTP service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
