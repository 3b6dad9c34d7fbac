// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! hCaptcha gate for the claim endpoint.

use crate::claim::ClaimContext;
use crate::config::CaptchaConfig;
use crate::gate::{Rejection, RequestGate};
use crate::metrics::Metrics;
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use tracing::{debug, warn};

/// Header carrying the widget's response token.
pub const CAPTCHA_HEADER: &str = "h-captcha-response";

pub const CAPTCHA_FAILED_MESSAGE: &str = "Captcha verification failed, please try again";

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies hCaptcha tokens. Without a secret every token passes.
pub struct CaptchaGate {
    config: CaptchaConfig,
    client: reqwest::Client,
    metrics: Metrics,
}

impl CaptchaGate {
    pub fn new(config: CaptchaConfig, metrics: Metrics) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            metrics,
        }
    }

    pub fn site_key(&self) -> &str {
        &self.config.site_key
    }

    /// Ask the verification endpoint whether `token` is valid.
    ///
    /// Any failure to get an answer counts as a failed verification.
    pub async fn verify(&self, token: &str) -> bool {
        if !self.config.is_enabled() {
            return true;
        }
        if token.is_empty() {
            debug!("Missing captcha token");
            return false;
        }

        let mut form = vec![("secret", self.config.secret.as_str()), ("response", token)];
        if !self.config.site_key.is_empty() {
            form.push(("sitekey", self.config.site_key.as_str()));
        }

        let response = match self
            .client
            .post(&self.config.verify_url)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Captcha verification request failed");
                return false;
            }
        };

        match response.json::<VerifyResponse>().await {
            Ok(verdict) => {
                if !verdict.success {
                    debug!(error_codes = ?verdict.error_codes, "Captcha token rejected");
                }
                verdict.success
            }
            Err(err) => {
                warn!(error = %err, "Unreadable captcha verification response");
                false
            }
        }
    }
}

#[async_trait]
impl RequestGate for CaptchaGate {
    type Receipt = ();

    fn name(&self) -> &'static str {
        "captcha"
    }

    async fn evaluate(&self, claim: &ClaimContext, headers: &HeaderMap) -> Result<(), Rejection> {
        let token = headers
            .get(CAPTCHA_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if self.verify(token).await {
            return Ok(());
        }

        self.metrics.captcha_failures.inc();
        debug!(address = %claim.address, "Claim failed captcha verification");
        Err(Rejection::too_many_requests(CAPTCHA_FAILED_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn claim() -> ClaimContext {
        ClaimContext {
            address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            remote_addr: "127.0.0.1:5000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_gate_passes() {
        let gate = CaptchaGate::new(CaptchaConfig::default(), Metrics::new().unwrap());
        assert!(gate.verify("").await);
        assert!(gate.evaluate(&claim(), &HeaderMap::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let gate = CaptchaGate::new(
            CaptchaConfig {
                secret: "0x0000000000000000000000000000000000000000".to_string(),
                ..Default::default()
            },
            Metrics::new().unwrap(),
        );

        let rejection = gate.evaluate(&claim(), &HeaderMap::new()).await.unwrap_err();
        assert_eq!(rejection.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rejection.message, CAPTCHA_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_unreachable_verifier_fails_closed() {
        let gate = CaptchaGate::new(
            CaptchaConfig {
                secret: "secret".to_string(),
                verify_url: "http://127.0.0.1:9/siteverify".to_string(),
                ..Default::default()
            },
            Metrics::new().unwrap(),
        );

        let mut headers = HeaderMap::new();
        headers.insert(CAPTCHA_HEADER, HeaderValue::from_static("10000000-aaaa-bbbb-cccc-000000000001"));
        assert!(gate.evaluate(&claim(), &headers).await.is_err());
    }
}
