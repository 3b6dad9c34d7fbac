// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Ethereum address and amount helpers.

use sha3::{Digest, Keccak256};

const WEI_PER_ETHER: f64 = 1e18;

/// Whether `s` starts with `0x` or `0X`.
pub fn has_0x_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X')
}

/// Whether `address` is 20 hex-encoded bytes with an optional `0x` prefix.
///
/// With `checksummed` set the address must also be spelled exactly as its
/// EIP-55 form, prefix included.
pub fn is_valid_address(address: &str, checksummed: bool) -> bool {
    match to_checksum_address(address) {
        Some(canonical) => !checksummed || canonical == address,
        None => false,
    }
}

fn is_hex_address(address: &str) -> bool {
    let digits = strip_0x(address);
    digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn strip_0x(s: &str) -> &str {
    if has_0x_prefix(s) {
        &s[2..]
    } else {
        s
    }
}

/// EIP-55 mixed-case spelling of a hex address, always `0x` prefixed.
///
/// `None` unless `address` is 40 hex digits with an optional `0x` prefix.
pub fn to_checksum_address(address: &str) -> Option<String> {
    if !is_hex_address(address) {
        return None;
    }
    let lower = strip_0x(address).to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Convert an ether amount to wei, truncating any fraction of a wei.
/// Negative and NaN amounts give zero.
pub fn ether_to_wei(amount: f64) -> u128 {
    (amount * WEI_PER_ETHER) as u128
}
