// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the client rate limiter.
//!
//! Defaults mirror the limits the application API ships with: 100 requests
//! per client per hour.

use crate::error::{ConfigError, Result};
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Configuration for the rate limiter service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window limits applied to every client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per client inside one window (default: 100)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Length of the trailing window in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often idle clients are swept, in seconds; 0 disables the sweeper (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Header carrying the client identifier (default: x-client-id)
    #[serde(default = "default_client_id_header")]
    pub client_id_header: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_client_id_header() -> String {
    "x-client-id".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            client_id_header: default_client_id_header(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval, `None` when sweeping is disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Reject limits the limiter cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_requests < 1 {
            return Err(ConfigError::InvalidMaxRequests(self.max_requests));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::InvalidWindow);
        }
        if HeaderName::from_bytes(self.client_id_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidHeaderName(
                self.client_id_header.clone(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
    /// - `MAX_REQUESTS`: Max requests per client per window (default: 100)
    /// - `WINDOW_SECS`: Window length in seconds (default: 3600)
    /// - `SWEEP_INTERVAL_SECS`: Idle sweep interval, 0 disables (default: 60)
    /// - `CLIENT_ID_HEADER`: Header naming the client (default: x-client-id)
    /// - `METRICS_ENABLED`: Expose `/metrics` (default: true)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RateLimitConfig::default();
        let config = Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(default_bind_addr),
            rate_limit: RateLimitConfig {
                max_requests: parse_var(&lookup, "MAX_REQUESTS")?
                    .unwrap_or(defaults.max_requests),
                window_secs: parse_var(&lookup, "WINDOW_SECS")?.unwrap_or(defaults.window_secs),
                sweep_interval_secs: parse_var(&lookup, "SWEEP_INTERVAL_SECS")?
                    .unwrap_or(defaults.sweep_interval_secs),
                client_id_header: lookup("CLIENT_ID_HEADER")
                    .map(|h| h.to_lowercase())
                    .unwrap_or(defaults.client_id_header),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED")?.unwrap_or_else(default_true),
                ..Default::default()
            },
        };

        config.rate_limit.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let value = match lookup(var) {
        Some(value) => value,
        None => return Ok(None),
    };

    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            warn!(var, value = %value, "Unparsable configuration value");
            Err(ConfigError::InvalidEnv { var, value })
        }
    }
}
