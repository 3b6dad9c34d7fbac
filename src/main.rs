// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Faucet Guard Service
//!
//! Fronts a faucet payout service with rate limiting and CAPTCHA checks.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables, optionally seeded
//! from a `.env` file:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `PROXY_COUNT`: Trusted reverse proxies in front of the service (default: 0)
//! - `RATE_LIMIT_INTERVAL_SECS`: Claim interval, 0 disables limiting (default: 86400)
//! - `RELEASE_SLOTS_ON_FAILURE`: Free client slots of failed claims (default: true)
//! - `HCAPTCHA_SITEKEY` / `HCAPTCHA_SECRET`: hCaptcha keys, empty secret disables
//! - `FAUCET_NETWORK`, `FAUCET_SYMBOL`, `FAUCET_PAYOUT`: Faucet parameters
//! - `PAYOUT_UPSTREAM_URL`: Payout service transfer endpoint
//! - `METRICS_ENABLED`: Expose Prometheus metrics at /metrics (default: true)

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use faucet_guard::{
    config::Config,
    dispenser::UpstreamDispenser,
    handlers::AppState,
    metrics::Metrics,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    config.validate()?;
    info!(
        bind_addr = %config.bind_addr,
        proxy_count = config.rate_limit.proxy_count,
        interval_secs = config.rate_limit.interval_secs,
        captcha = config.captcha.is_enabled(),
        upstream = %config.faucet.upstream_url,
        "Starting faucet guard"
    );

    // Create application state
    let metrics = Metrics::new()?;
    let dispenser = Arc::new(UpstreamDispenser::new(config.faucet.upstream_url.clone()));
    let state = Arc::new(AppState::new(config.clone(), dispenser, metrics));

    // Spawn cleanup task
    let limiter = state.limiter.clone();
    let period = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = limiter.cleanup().await;
            if purged > 0 {
                debug!(purged, "Purged expired rate limit entries");
            }
        }
    });

    let app = server::router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = Config::default();
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        rate_limit: faucet_guard::config::RateLimitConfig {
            proxy_count: env_or("PROXY_COUNT", defaults.rate_limit.proxy_count),
            interval_secs: env_or("RATE_LIMIT_INTERVAL_SECS", defaults.rate_limit.interval_secs),
            release_slots_on_failure: env_or(
                "RELEASE_SLOTS_ON_FAILURE",
                defaults.rate_limit.release_slots_on_failure,
            ),
            ..defaults.rate_limit
        },
        captcha: faucet_guard::config::CaptchaConfig {
            site_key: std::env::var("HCAPTCHA_SITEKEY").unwrap_or_default(),
            secret: std::env::var("HCAPTCHA_SECRET").unwrap_or_default(),
            ..defaults.captcha
        },
        faucet: faucet_guard::config::FaucetConfig {
            network: std::env::var("FAUCET_NETWORK").unwrap_or(defaults.faucet.network),
            symbol: std::env::var("FAUCET_SYMBOL").unwrap_or(defaults.faucet.symbol),
            payout: env_or("FAUCET_PAYOUT", defaults.faucet.payout),
            upstream_url: std::env::var("PAYOUT_UPSTREAM_URL")
                .unwrap_or(defaults.faucet.upstream_url),
            ..defaults.faucet
        },
        metrics: faucet_guard::config::MetricsConfig {
            enabled: env_or("METRICS_ENABLED", defaults.metrics.enabled),
            ..defaults.metrics
        },
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
