// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for attack simulation.

use faucet_guard::chain::to_checksum_address;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client IP addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate a pool of distinct, checksummed payout addresses.
pub fn generate_addresses(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| to_checksum_address(&format!("{:040x}", i + 1)).unwrap())
        .collect()
}

/// An `X-Forwarded-For` value with a caller-chosen entry in front of the
/// one a single trusted proxy appended.
pub fn forged_forwarded_for(index: usize, real_ip: &str) -> String {
    format!("203.0.{}.{}, {}", (index >> 8) & 0xFF, index & 0xFF, real_ip)
}

/// Address strings the claim parser must refuse.
pub fn generate_malformed_addresses() -> Vec<String> {
    let valid = to_checksum_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
    vec![
        String::new(),
        "0x".to_string(),
        "0x1234".to_string(),
        "not-an-address".to_string(),
        // Checksum broken by case
        valid.to_lowercase(),
        valid.to_uppercase().replacen("0X", "0x", 1),
        // One digit short and one too many
        valid[..41].to_string(),
        format!("{valid}0"),
        // Non-hex digit
        format!("0xZ{}", &valid[3..]),
    ]
}
