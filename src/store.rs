// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Key store whose entries vanish after a fixed time-to-live.
//!
//! Lookups report the remaining lifetime but never renew it, so an entry
//! recorded at `t0` with TTL `d` is gone at `t0 + d` no matter how often it
//! is read. The store has no locking of its own; callers wrap it.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Expiring presence set keyed by `K`.
#[derive(Debug)]
pub struct ExpiringStore<K> {
    /// key -> expiry instant
    entries: HashMap<K, Instant>,
}

impl<K: Eq + Hash> ExpiringStore<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record `key` as present for `ttl`, replacing any previous expiry.
    pub fn set(&mut self, key: K, ttl: Duration) {
        self.set_until(key, Instant::now() + ttl);
    }

    /// Record `key` as present until `expires_at`.
    pub fn set_until(&mut self, key: K, expires_at: Instant) {
        self.entries.insert(key, expires_at);
    }

    /// Remaining lifetime of `key`, or `None` if absent or expired.
    pub fn get(&self, key: &K) -> Option<Duration> {
        let expires_at = self.entries.get(key)?;
        let remaining = expires_at.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    /// Remaining lifetime of `key`, zero if absent.
    pub fn remaining(&self, key: &K) -> Duration {
        self.get(key).unwrap_or(Duration::ZERO)
    }

    /// Drop `key`. Returns whether a live entry was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some(expires_at) => expires_at > Instant::now(),
            None => false,
        }
    }

    /// Drop `key` only if it still holds the expiry `expires_at`, i.e. it
    /// has not been re-recorded since. Returns whether it was dropped.
    pub fn remove_if_expires_at(&mut self, key: &K, expires_at: Instant) -> bool {
        if self.entries.get(key) == Some(&expires_at) {
            self.entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Drop every expired entry and return how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash> Default for ExpiringStore<K> {
    fn default() -> Self {
        Self::new()
    }
}
