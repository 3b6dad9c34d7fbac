// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the faucet guard service.

use crate::captcha::CaptchaGate;
use crate::chain;
use crate::claim::{ClaimContext, ClaimParser};
use crate::config::Config;
use crate::dispenser::Dispenser;
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub captcha: Arc<CaptchaGate>,
    pub claims: Arc<ClaimParser>,
    pub dispenser: Arc<dyn Dispenser>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, dispenser: Arc<dyn Dispenser>, metrics: Metrics) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(&config.rate_limit, metrics.clone())),
            captcha: Arc::new(CaptchaGate::new(config.captcha.clone(), metrics.clone())),
            claims: Arc::new(ClaimParser::new(&config.faucet)),
            dispenser,
            metrics,
            config,
        }
    }
}

/// Body of every claim endpoint response, success or failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Public faucet parameters for the web front end.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub network: String,
    pub symbol: String,
    pub payout: String,
    pub hcaptcha_sitekey: String,
}

/// JSON `{"message": ...}` response with the given status.
pub fn render_message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ClaimResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "faucet-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let faucet = &state.config.faucet;
    Json(InfoResponse {
        network: faucet.network.clone(),
        symbol: faucet.symbol.clone(),
        payout: faucet.payout.to_string(),
        hcaptcha_sitekey: state.captcha.site_key().to_string(),
    })
}

/// Pay out to a claim that made it through every gate.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<ClaimContext>,
) -> Response {
    let value = chain::ether_to_wei(state.config.faucet.payout);

    match state.dispenser.transfer(&claim.address, value).await {
        Ok(tx_hash) => {
            state.metrics.claims.with_label_values(&["sent"]).inc();
            info!(%tx_hash, address = %claim.address, "Transaction sent successfully");
            render_message(StatusCode::OK, format!("Txhash: {tx_hash}"))
        }
        Err(err) => {
            state.metrics.claims.with_label_values(&["failed"]).inc();
            error!(error = %err, address = %claim.address, "Failed to send transaction");
            render_message(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
