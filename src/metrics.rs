// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for claim admission.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters shared by the gates and the claim handler.
///
/// Each instance owns its registry, so tests can build as many as they like.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Claims that passed the rate limiter
    pub admitted: IntCounterVec,
    /// Claims rejected by the rate limiter, by reason
    pub limited: IntCounterVec,
    /// Limiter entries released after an unsuccessful claim
    pub rolled_back: IntCounter,
    /// Claims rejected by the CAPTCHA gate
    pub captcha_failures: IntCounter,
    /// Payout attempts, by outcome
    pub claims: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("faucet_guard".to_string()), None)?;

        let admitted = IntCounterVec::new(
            Opts::new("admitted_total", "Claims admitted by the rate limiter"),
            &["mode"],
        )?;
        let limited = IntCounterVec::new(
            Opts::new("limited_total", "Claims rejected by the rate limiter"),
            &["reason"],
        )?;
        let rolled_back = IntCounter::new(
            "rolled_back_total",
            "Rate limit entries released after an unsuccessful claim",
        )?;
        let captcha_failures =
            IntCounter::new("captcha_failures_total", "Claims failing CAPTCHA verification")?;
        let claims = IntCounterVec::new(
            Opts::new("claims_total", "Payout attempts by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(admitted.clone()))?;
        registry.register(Box::new(limited.clone()))?;
        registry.register(Box::new(rolled_back.clone()))?;
        registry.register(Box::new(captcha_failures.clone()))?;
        registry.register(Box::new(claims.clone()))?;

        Ok(Self {
            registry,
            admitted,
            limited,
            rolled_back,
            captcha_failures,
            claims,
        })
    }

    /// Render all counters in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_prefixed_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.limited.with_label_values(&["address"]).inc();
        metrics.rolled_back.inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("faucet_guard_limited_total{reason=\"address\"} 1"));
        assert!(text.contains("faucet_guard_rolled_back_total 1"));
    }
}
