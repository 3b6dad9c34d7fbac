// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim request extraction.
//!
//! Runs ahead of every gate: the body is buffered, decoded and the address
//! validated, so malformed claims are answered here and never touch the
//! rate limiter. The buffered body is handed on unchanged.

use crate::chain;
use crate::config::FaucetConfig;
use crate::handlers::render_message;
use axum::{
    body::{self, Body},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Claim body accepted by `/api/claim`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimRequest {
    pub address: String,
}

/// A decoded claim, stored in request extensions for the gates and handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimContext {
    /// Validated payout address
    pub address: String,
    /// Peer address of the connection, `host:port`, empty if unknown
    pub remote_addr: String,
}

/// Reasons a claim body is refused before any gate runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Content-Type header is not application/json")]
    UnsupportedContentType,

    #[error("Request body must not be empty")]
    EmptyBody,

    #[error("Request body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Request body contains badly-formed JSON (at line {line} column {column})")]
    Syntax { line: usize, column: usize },

    #[error("Request body contains badly-formed JSON")]
    UnexpectedEof,

    #[error("Request body contains unknown field \"{0}\"")]
    UnknownField(String),

    #[error("Request body contains an invalid value (at line {line} column {column})")]
    InvalidValue { line: usize, column: usize },

    #[error("invalid address")]
    InvalidAddress,

    /// Anything unclassified. The detail is logged, not returned.
    #[error("Internal Server Error")]
    Internal(String),
}

impl ClaimError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax => Self::Syntax {
                line: err.line(),
                column: err.column(),
            },
            Category::Eof => Self::UnexpectedEof,
            Category::Data => match unknown_field(&err.to_string()) {
                Some(field) => Self::UnknownField(field),
                None => Self::InvalidValue {
                    line: err.line(),
                    column: err.column(),
                },
            },
            Category::Io => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ClaimError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            warn!(error = %detail, "Claim extraction failed");
        }
        render_message(self.status(), self.to_string())
    }
}

/// Pulls the field name out of serde's "unknown field `x`, expected ..." text.
fn unknown_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("unknown field `")?;
    let (field, _) = rest.split_once('`')?;
    Some(field.to_string())
}

/// Decodes and validates claim bodies.
#[derive(Debug, Clone)]
pub struct ClaimParser {
    require_checksum: bool,
    max_body_bytes: usize,
}

impl ClaimParser {
    pub fn new(config: &FaucetConfig) -> Self {
        Self {
            require_checksum: config.require_checksum,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Decode a buffered body and validate its address.
    ///
    /// The returned address is always the `0x` prefixed EIP-55 spelling, so
    /// every spelling of one address maps to the same limiter key.
    pub fn parse(&self, headers: &HeaderMap, bytes: &[u8]) -> Result<ClaimRequest, ClaimError> {
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            let media_type = content_type
                .to_str()
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default()
                .trim();
            if !media_type.eq_ignore_ascii_case("application/json") {
                return Err(ClaimError::UnsupportedContentType);
            }
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ClaimError::EmptyBody);
        }

        let mut claim: ClaimRequest =
            serde_json::from_slice(bytes).map_err(ClaimError::from_json)?;

        if !chain::is_valid_address(&claim.address, self.require_checksum) {
            debug!(address = %claim.address, "Rejected malformed address");
            return Err(ClaimError::InvalidAddress);
        }
        claim.address =
            chain::to_checksum_address(&claim.address).ok_or(ClaimError::InvalidAddress)?;

        Ok(claim)
    }

    fn declared_length(&self, headers: &HeaderMap) -> Option<usize> {
        headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

/// Middleware decoding the claim and attaching a [`ClaimContext`].
pub async fn extract_claim(
    State(parser): State<Arc<ClaimParser>>,
    request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let (mut parts, body) = request.into_parts();
    let limit = parser.max_body_bytes;

    let declared = parser.declared_length(&parts.headers);
    if declared.is_some_and(|len| len > limit) {
        return ClaimError::TooLarge { limit }.into_response();
    }

    let bytes = match body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        // Without a declared length the only way to fail here is the limit.
        Err(err) => {
            return match declared {
                Some(_) => ClaimError::Internal(err.to_string()),
                None => ClaimError::TooLarge { limit },
            }
            .into_response();
        }
    };

    let claim = match parser.parse(&parts.headers, &bytes) {
        Ok(claim) => claim,
        Err(err) => {
            debug!(error = %err, "Malformed claim request");
            return err.into_response();
        }
    };

    parts.extensions.insert(ClaimContext {
        address: claim.address,
        remote_addr,
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
