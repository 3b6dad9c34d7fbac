// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack simulation patterns for security testing.

use std::time::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of claims to send
    pub total_requests: usize,
    /// Virtual time between claims
    pub interval: Duration,
    /// Number of unique client IPs to simulate
    pub unique_ips: usize,
    /// Number of unique payout addresses
    pub unique_addresses: usize,
    /// Prepend a forged entry to `X-Forwarded-For`
    pub forge_forwarded_for: bool,
    /// Send malformed addresses only
    pub malformed: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 50,
            interval: Duration::from_secs(1),
            unique_ips: 1,
            unique_addresses: 50,
            forge_forwarded_for: false,
            malformed: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client cycling through fresh addresses.
    pub fn address_rotation() -> Self {
        Self::default()
    }

    /// One address claimed from many clients.
    pub fn address_replay() -> Self {
        Self {
            unique_ips: 25,
            unique_addresses: 1,
            ..Default::default()
        }
    }

    /// One client rotating a forged `X-Forwarded-For` prefix.
    pub fn forged_header_rotation() -> Self {
        Self {
            forge_forwarded_for: true,
            ..Default::default()
        }
    }

    /// Many clients, each claiming for fresh addresses.
    pub fn distributed_claims() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 25,
            unique_addresses: 100,
            ..Default::default()
        }
    }

    /// Garbage addresses from a handful of clients.
    pub fn malformed_spray() -> Self {
        Self {
            unique_ips: 5,
            malformed: true,
            ..Default::default()
        }
    }

    /// One client claiming just slowly enough to always find a free slot
    /// under a one hour interval.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 20,
            interval: Duration::from_secs(15 * 60 + 1),
            unique_addresses: 20,
            ..Default::default()
        }
    }
}
