// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client Rate Limiter Service
//!
//! A standalone sliding-window rate limiter. Each client may make at most
//! `MAX_REQUESTS` requests inside any trailing `WINDOW_SECS` window.
//!
//! ## Usage
//!
//! 1. **Decision service**: callers `POST /check` with `{"client_id": ...}`
//!    and act on the `allowed` flag.
//!
//! 2. **Forward auth**: a proxy sends each request to `/gate`; the client is
//!    taken from the `CLIENT_ID_HEADER` header or the peer address, and a
//!    rejected request gets `429` with `Retry-After`.
//!
//! ## Configuration
//!
//! See [`Config::from_env`] for the environment variables read at startup.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use client_rate_limiter::{
    config::Config,
    handlers::{router, AppState},
    sweeper::Sweeper,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        sweep_interval_secs = config.rate_limit.sweep_interval_secs,
        "Starting client rate limiter"
    );

    let state = Arc::new(AppState::new(config.clone())?);

    let _sweeper = match config.rate_limit.sweep_interval() {
        Some(interval) => Some(Sweeper::spawn(
            state.limiter.clone(),
            interval,
            Some(state.metrics.clone()),
        )?),
        None => {
            info!("Idle client sweeper disabled");
            None
        }
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
