// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the client rate limiter service.
//!
//! The service can be queried directly (`/check`), used as a forward-auth
//! endpoint (`/gate`), or embedded in another router through the
//! [`enforce`] middleware, which maps a rejection to `429 Too Many Requests`.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::ServiceError;
use crate::limiter::{RateLimitDecision, SlidingWindowLimiter};
use crate::metrics::LimiterMetrics;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Key used when a request carries neither a client header nor a peer address.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Shared application state.
pub struct AppState<C = SystemClock> {
    pub limiter: Arc<SlidingWindowLimiter<C>>,
    pub metrics: LimiterMetrics,
    pub config: Config,
}

impl AppState<SystemClock> {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AppState<C> {
    pub fn with_clock(config: Config, clock: C) -> Result<Self, ServiceError> {
        config.rate_limit.validate()?;
        let limiter = SlidingWindowLimiter::with_clock(
            config.rate_limit.max_requests,
            config.rate_limit.window_duration(),
            clock,
        )?;

        Ok(Self {
            limiter: Arc::new(limiter),
            metrics: LimiterMetrics::new()?,
            config,
        })
    }

    /// Run one decision and count it.
    fn decide(&self, client_id: &str) -> RateLimitDecision {
        let decision = self.limiter.check(client_id);
        self.metrics.record(&decision);
        decision
    }
}

/// Build the service router.
pub fn router<C: Clock + 'static>(state: Arc<AppState<C>>) -> Router {
    let gated = Router::new()
        .route("/gate", any(gate))
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce::<C>));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check::<C>))
        .merge(gated);

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(prometheus_metrics::<C>));
    }

    app.with_state(state)
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Rate limit check request.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub client_id: String,
}

/// Rate limit check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "client-rate-limiter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Admit or reject one request on behalf of `client_id`.
pub async fn check<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<CheckRequest>,
) -> impl IntoResponse {
    let client_id = req.client_id.trim();
    if client_id.is_empty() {
        warn!("Rejected check without client_id");
        return (
            StatusCode::BAD_REQUEST,
            Json(CheckResponse {
                allowed: false,
                reason: Some("client_id must not be empty".to_string()),
                retry_after_secs: None,
                remaining: None,
            }),
        );
    }

    match state.decide(client_id) {
        RateLimitDecision::Allowed { remaining, .. } => {
            debug!(client_id, remaining, "Request allowed");
            (
                StatusCode::OK,
                Json(CheckResponse {
                    allowed: true,
                    reason: None,
                    retry_after_secs: None,
                    remaining: Some(remaining),
                }),
            )
        }
        RateLimitDecision::Limited { retry_after } => {
            let retry_after_secs = retry_after_secs(retry_after);
            info!(client_id, retry_after_secs, "Request rate limited");
            (
                StatusCode::OK,
                Json(CheckResponse {
                    allowed: false,
                    reason: Some("Client rate limit exceeded".to_string()),
                    retry_after_secs: Some(retry_after_secs),
                    remaining: None,
                }),
            )
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn prometheus_metrics<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Response {
    state
        .metrics
        .set_tracked_clients(state.limiter.tracked_clients());

    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Forward-auth endpoint; only reached when [`enforce`] admitted the request.
pub async fn gate() -> &'static str {
    "Request admitted"
}

/// Middleware applying the client rate limit to every request it wraps.
pub async fn enforce<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    request: Request,
    next: Next,
) -> Response {
    let client_id = client_key(&request, &state.config.rate_limit.client_id_header);

    debug!(
        client_id = %client_id,
        path = %request.uri().path(),
        "Processing gated request"
    );

    match state.decide(&client_id) {
        RateLimitDecision::Allowed { remaining, .. } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.limiter.max_requests()),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        RateLimitDecision::Limited { retry_after } => {
            let retry_secs = retry_after_secs(retry_after);
            info!(client_id = %client_id, retry_secs, "Request rate limited");
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(ErrorResponse {
                    error: "Client rate limit exceeded".to_string(),
                    code: "RATE_LIMITED",
                    retry_after_secs: Some(retry_secs),
                }),
            )
                .into_response()
        }
    }
}

/// Identify the caller: configured header first, then the peer address.
fn client_key(request: &Request, header_name: &str) -> String {
    let from_header = request
        .headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(id) = from_header {
        return id.to_string();
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => ANONYMOUS_CLIENT.to_string(),
    }
}

/// Whole seconds a client should wait, rounded up and never zero.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}
