// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Payout interface consumed by the claim handler.
//!
//! Signing and broadcasting transfers lives in a separate payout service;
//! this side only asks it to send `value` wei to an address.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispenseError {
    #[error("payout service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payout service returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Sends faucet payouts.
#[async_trait]
pub trait Dispenser: Send + Sync {
    /// Transfer `value` wei to `address`, returning the transaction hash.
    async fn transfer(&self, address: &str, value: u128) -> Result<String, DispenseError>;
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    address: &'a str,
    /// Decimal string; wei amounts overflow JSON numbers
    value: String,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Dispenser posting transfers to an HTTP payout service.
pub struct UpstreamDispenser {
    url: String,
    client: reqwest::Client,
}

impl UpstreamDispenser {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Dispenser for UpstreamDispenser {
    async fn transfer(&self, address: &str, value: u128) -> Result<String, DispenseError> {
        let response = self
            .client
            .post(&self.url)
            .json(&TransferRequest {
                address,
                value: value.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: TransferResponse = response.json().await?;
            return Ok(body.tx_hash);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(DispenseError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_encodes_value_as_string() {
        let body = serde_json::to_value(TransferRequest {
            address: "0xabc",
            value: 1_000_000_000_000_000_000u128.to_string(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"address": "0xabc", "value": "1000000000000000000"})
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let dispenser = UpstreamDispenser::new("http://127.0.0.1:9/transfer".to_string());
        let err = dispenser.transfer("0xabc", 1).await.unwrap_err();
        assert!(matches!(err, DispenseError::Transport(_)));
    }
}
