// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request gates guarding the claim endpoint.
//!
//! A gate either admits a claim, handing back a receipt, or rejects it with
//! a response for the caller. Admitted claims run the rest of the stack, and
//! the gate is then shown the final status so it can undo its bookkeeping.

use crate::claim::ClaimContext;
use crate::handlers::render_message;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

/// Response for a claim a gate refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: String,
}

impl Rejection {
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: message.into(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        render_message(self.status, self.message)
    }
}

#[async_trait]
pub trait RequestGate: Send + Sync {
    /// State carried from `evaluate` to `settle` for an admitted claim.
    type Receipt: Send + 'static;

    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        claim: &ClaimContext,
        headers: &HeaderMap,
    ) -> Result<Self::Receipt, Rejection>;

    /// Called with the downstream status once an admitted claim completes.
    async fn settle(&self, _receipt: Self::Receipt, _status: StatusCode) {}
}

/// Middleware running one gate in front of the rest of the stack.
///
/// Requires the claim extraction layer to have run first.
pub async fn enforce<G>(State(gate): State<Arc<G>>, request: Request, next: Next) -> Response
where
    G: RequestGate + 'static,
{
    let Some(claim) = request.extensions().get::<ClaimContext>().cloned() else {
        error!(gate = gate.name(), "Claim context missing from request");
        return render_message(
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::INTERNAL_SERVER_ERROR
                .canonical_reason()
                .unwrap_or_default(),
        );
    };

    match gate.evaluate(&claim, request.headers()).await {
        Ok(receipt) => {
            let response = next.run(request).await;
            gate.settle(receipt, response.status()).await;
            response
        }
        Err(rejection) => rejection.into_response(),
    }
}
