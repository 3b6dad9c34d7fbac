// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Faucet Guard
//!
//! This crate protects a token faucet's claim endpoint against abuse:
//!
//! - One claim per payout address per interval
//! - Up to four claims per client network identifier per interval
//! - Client identification behind a configured number of reverse proxies
//! - Rollback of limiter entries when a payout fails
//! - Optional hCaptcha verification
//! - Address validation (EIP-55 checksums) before any limiting happens

pub mod captcha;
pub mod chain;
pub mod claim;
pub mod client_ip;
pub mod config;
pub mod dispenser;
pub mod gate;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod server;
pub mod store;

pub use config::Config;
pub use gate::{Rejection, RequestGate};
pub use limiter::{RateLimitResult, RateLimiter};
