// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the faucet guard.
//!
//! Every section deserializes with per-field defaults, so a partial config
//! (or none at all) yields a working development setup with rate limiting
//! enabled and the CAPTCHA gate switched off.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration for the faucet guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// hCaptcha configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Faucet payout configuration
    #[serde(default)]
    pub faucet: FaucetConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Claim rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Number of trusted reverse proxies in front of the service (default: 0)
    #[serde(default)]
    pub proxy_count: usize,

    /// How long an address or client stays limited after a claim, in
    /// seconds. Zero or negative disables rate limiting (default: 86400)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: i64,

    /// Also free the client slot taken by a claim whose payout failed
    /// (default: true). `false` keeps the slot until it expires.
    #[serde(default = "default_true")]
    pub release_slots_on_failure: bool,

    /// Period of the expired-entry purge task in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// hCaptcha configuration. An empty secret disables verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default)]
    pub site_key: String,

    #[serde(default)]
    pub secret: String,

    /// Verification endpoint (default: https://api.hcaptcha.com/siteverify)
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

/// Faucet payout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Network name shown by `/api/info` (default: testnet)
    #[serde(default = "default_network")]
    pub network: String,

    /// Currency symbol shown by `/api/info` (default: ETH)
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Amount paid per claim, in ether (default: 1.0)
    #[serde(default = "default_payout")]
    pub payout: f64,

    /// Payout service that signs and broadcasts transfers
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Only accept EIP-55 checksummed addresses (default: true)
    #[serde(default = "default_true")]
    pub require_checksum: bool,

    /// Largest accepted claim body in bytes (default: 1 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
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

/// Configuration rejected at start-up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL for {field}: {url}")]
    InvalidUrl { field: &'static str, url: String },

    #[error("Payout must be a positive amount, got {0}")]
    InvalidPayout(f64),

    #[error("Metrics path must start with '/', got {0:?}")]
    InvalidMetricsPath(String),
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_interval_secs() -> i64 {
    86_400 // one claim per day
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_verify_url() -> String {
    "https://api.hcaptcha.com/siteverify".to_string()
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_symbol() -> String {
    "ETH".to_string()
}

fn default_payout() -> f64 {
    1.0
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8545/transfer".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
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
            captcha: CaptchaConfig::default(),
            faucet: FaucetConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            proxy_count: 0,
            interval_secs: default_interval_secs(),
            release_slots_on_failure: default_true(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret: String::new(),
            verify_url: default_verify_url(),
        }
    }
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            symbol: default_symbol(),
            payout: default_payout(),
            upstream_url: default_upstream_url(),
            require_checksum: default_true(),
            max_body_bytes: default_max_body_bytes(),
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

impl Config {
    /// Check the values that would otherwise only fail on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("faucet.upstream_url", &self.faucet.upstream_url)?;
        if self.captcha.is_enabled() {
            check_url("captcha.verify_url", &self.captcha.verify_url)?;
        }
        if !(self.faucet.payout.is_finite() && self.faucet.payout > 0.0) {
            return Err(ConfigError::InvalidPayout(self.faucet.payout));
        }
        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::InvalidMetricsPath(self.metrics.path.clone()));
        }
        Ok(())
    }
}

impl RateLimitConfig {
    /// Lifetime of a limiter entry, or `None` when limiting is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        u64::try_from(self.interval_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Get the purge task period
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl CaptchaConfig {
    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }
}

fn check_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field,
            url: raw.to_string(),
        }),
    }
}
