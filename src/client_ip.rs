// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identity resolution behind a known number of reverse proxies.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client network identifier for a request.
///
/// With `proxy_count` trusted proxies each appending to `X-Forwarded-For`,
/// the client is the entry `proxy_count` positions from the right. Entries
/// further left were supplied by the caller and cannot be trusted, so a
/// header shorter than expected resolves to its left-most entry instead of
/// failing.
pub fn resolve(proxy_count: usize, headers: &HeaderMap, remote_addr: &str) -> String {
    if proxy_count > 0 {
        if let Some(forwarded) = headers
            .get(X_FORWARDED_FOR)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .filter(|v| !v.is_empty())
        {
            let parts: Vec<&str> = forwarded.split(',').collect();
            let index = parts.len().saturating_sub(proxy_count);
            return parts[index].trim().to_string();
        }
    }

    host_of(remote_addr)
}

/// Strip the port from a `host:port` peer address; unparseable input is
/// returned as-is.
fn host_of(remote_addr: &str) -> String {
    if let Ok(addr) = remote_addr.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }

    match remote_addr.rsplit_once(':') {
        Some((host, port))
            if !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok() =>
        {
            host.to_string()
        }
        _ => remote_addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_picks_entry_by_proxy_count() {
        let headers = forwarded("1.1.1.1, 2.2.2.2, 3.3.3.3");

        assert_eq!(resolve(1, &headers, "10.0.0.1:4000"), "3.3.3.3");
        assert_eq!(resolve(2, &headers, "10.0.0.1:4000"), "2.2.2.2");
        assert_eq!(resolve(3, &headers, "10.0.0.1:4000"), "1.1.1.1");
    }

    #[test]
    fn test_short_header_clamps_to_first_entry() {
        let headers = forwarded("1.1.1.1, 2.2.2.2, 3.3.3.3");
        assert_eq!(resolve(5, &headers, "10.0.0.1:4000"), "1.1.1.1");
    }

    #[test]
    fn test_non_utf8_header_still_split() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_bytes(b"9.9.9.9\xff, 3.3.3.3").unwrap(),
        );

        assert_eq!(resolve(1, &headers, "10.0.0.1:4000"), "3.3.3.3");
        assert_eq!(resolve(2, &headers, "10.0.0.1:4000"), "9.9.9.9\u{fffd}");
    }

    #[test]
    fn test_header_ignored_without_proxies() {
        let headers = forwarded("6.6.6.6");
        assert_eq!(resolve(0, &headers, "10.0.0.1:4000"), "10.0.0.1");
    }

    #[test]
    fn test_missing_header_falls_back_to_peer() {
        assert_eq!(resolve(2, &HeaderMap::new(), "192.168.1.7:52000"), "192.168.1.7");
        assert_eq!(resolve(1, &HeaderMap::new(), "[::1]:8080"), "::1");
        assert_eq!(resolve(0, &HeaderMap::new(), "localhost:8080"), "localhost");
    }

    #[test]
    fn test_unparseable_peer_returned_raw() {
        assert_eq!(resolve(0, &HeaderMap::new(), "10.0.0.1"), "10.0.0.1");
        assert_eq!(resolve(0, &HeaderMap::new(), "unix-socket"), "unix-socket");
        assert_eq!(resolve(0, &HeaderMap::new(), ""), "");
    }
}
