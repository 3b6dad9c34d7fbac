// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim rate limiter.
//!
//! Two identities are limited per claim:
//! 1. The payout address: one claim per interval.
//! 2. The client network identifier: up to four claims per interval.
//!
//! The client allowance is tracked with four slot entries next to a plain
//! client entry. A client is refused only while its plain entry is live and
//! every slot is occupied; the wait reported is the time until the oldest
//! slot frees up.
//!
//! The whole check-then-record sequence runs under one lock so concurrent
//! claims for the same key cannot both be admitted. The lock is not held
//! while the payout runs.

use crate::claim::ClaimContext;
use crate::client_ip;
use crate::config::RateLimitConfig;
use crate::gate::{Rejection, RequestGate};
use crate::metrics::Metrics;
use crate::store::ExpiringStore;
use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Claims a single client identifier may have in flight per interval.
pub const SLOT_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LimitKey {
    Address(String),
    Client(String),
    ClientSlot(String, usize),
}

/// Store keys belonging to one client identifier.
struct ClientKeys {
    client: LimitKey,
    slots: [LimitKey; SLOT_COUNT],
}

impl ClientKeys {
    fn new(client_ip: &str) -> Self {
        Self {
            client: LimitKey::Client(client_ip.to_string()),
            slots: std::array::from_fn(|i| LimitKey::ClientSlot(client_ip.to_string(), i)),
        }
    }

    /// Time until the first slot frees up; zero if any slot is free.
    fn oldest_slot_remaining(&self, store: &ExpiringStore<LimitKey>) -> Duration {
        self.slots
            .iter()
            .map(|slot| store.remaining(slot))
            .min()
            .unwrap_or(Duration::ZERO)
    }

    fn first_free_slot(&self, store: &ExpiringStore<LimitKey>) -> Option<usize> {
        self.slots.iter().position(|slot| store.get(slot).is_none())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Claim admitted. `None` when rate limiting is disabled.
    Allowed(Option<Reservation>),
    /// Claim refused
    Limited {
        reason: RateLimitReason,
        /// Time until the blocking entry expires
        retry_after: Duration,
    },
}

/// Reason for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// The address already claimed within the interval
    AddressClaimed,
    /// The client used all of its slots within the interval
    ClientSlotsExhausted,
}

impl RateLimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddressClaimed => "address",
            Self::ClientSlotsExhausted => "client",
        }
    }

    /// Wait shown to the caller.
    ///
    /// Address waits round the duration itself to the nearest second;
    /// client waits round the floating point seconds. The two agree except
    /// at exact half-second ties past the precision of an `f64`.
    pub fn rounded_wait(&self, retry_after: Duration) -> Duration {
        match self {
            Self::AddressClaimed => {
                Duration::from_secs(((retry_after.as_nanos() + 500_000_000) / 1_000_000_000) as u64)
            }
            Self::ClientSlotsExhausted => Duration::from_secs(retry_after.as_secs_f64().round() as u64),
        }
    }
}

impl std::fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddressClaimed => write!(f, "Address already claimed"),
            Self::ClientSlotsExhausted => write!(f, "Client claim allowance exhausted"),
        }
    }
}

/// Entries recorded for an admitted claim, needed to roll it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub address: String,
    pub client_ip: String,
    /// Slot taken by this claim; `None` if all slots were already live
    pub slot: Option<usize>,
    /// Expiry shared by every entry this claim recorded
    pub expires_at: Instant,
}

/// Text returned with a 429 for a rate limited claim.
pub fn limit_message(wait: Duration) -> String {
    format!(
        "You have exceeded the rate limit. Please wait {} before you try again",
        format_wait(wait)
    )
}

/// Render whole seconds as `1h2m3s`, dropping leading zero units.
pub fn format_wait(wait: Duration) -> String {
    let total = wait.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Thread-safe claim rate limiter.
pub struct RateLimiter {
    /// Trusted reverse proxies in front of the service
    proxy_count: usize,
    /// Entry lifetime; `None` disables limiting
    ttl: Option<Duration>,
    release_slots_on_failure: bool,
    store: Mutex<ExpiringStore<LimitKey>>,
    metrics: Metrics,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: &RateLimitConfig, metrics: Metrics) -> Self {
        Self {
            proxy_count: config.proxy_count,
            ttl: config.ttl(),
            release_slots_on_failure: config.release_slots_on_failure,
            store: Mutex::new(ExpiringStore::new()),
            metrics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Check a claim and, if admitted, record it.
    pub async fn check(&self, address: &str, client_ip: &str) -> RateLimitResult {
        let Some(ttl) = self.ttl else {
            self.metrics.admitted.with_label_values(&["unlimited"]).inc();
            return RateLimitResult::Allowed(None);
        };

        let mut store = self.store.lock().await;

        let address_key = LimitKey::Address(address.to_string());
        if let Some(retry_after) = store.get(&address_key) {
            return self.limited(RateLimitReason::AddressClaimed, retry_after);
        }

        let client = ClientKeys::new(client_ip);
        if store.get(&client.client).is_some() {
            let retry_after = client.oldest_slot_remaining(&store);
            if !retry_after.is_zero() {
                return self.limited(RateLimitReason::ClientSlotsExhausted, retry_after);
            }
        }

        let expires_at = Instant::now() + ttl;
        store.set_until(address_key, expires_at);
        store.set_until(client.client.clone(), expires_at);

        let slot = client.first_free_slot(&store);
        if let Some(index) = slot {
            store.set_until(client.slots[index].clone(), expires_at);
        }
        drop(store);

        debug!(%address, %client_ip, ?slot, "Claim admitted");
        self.metrics.admitted.with_label_values(&["tracked"]).inc();

        RateLimitResult::Allowed(Some(Reservation {
            address: address.to_string(),
            client_ip: client_ip.to_string(),
            slot,
            expires_at,
        }))
    }

    fn limited(&self, reason: RateLimitReason, retry_after: Duration) -> RateLimitResult {
        self.metrics.limited.with_label_values(&[reason.as_str()]).inc();
        RateLimitResult::Limited {
            reason,
            retry_after,
        }
    }

    /// Settle an admitted claim once its handler has answered.
    ///
    /// An unsuccessful claim releases the address and client entries so the
    /// caller may retry. Its slot is released too unless configured to keep
    /// it until expiry. Entries recorded again by a later claim are left
    /// alone.
    pub async fn observe(&self, reservation: Reservation, status: StatusCode) {
        if status.is_success() {
            info!(
                address = %reservation.address,
                client_ip = %reservation.client_ip,
                "Claim completed, rate limit window started"
            );
            return;
        }

        let expires_at = reservation.expires_at;
        let mut store = self.store.lock().await;
        store.remove_if_expires_at(&LimitKey::Address(reservation.address.clone()), expires_at);
        store.remove_if_expires_at(&LimitKey::Client(reservation.client_ip.clone()), expires_at);
        if self.release_slots_on_failure {
            if let Some(index) = reservation.slot {
                store.remove_if_expires_at(
                    &LimitKey::ClientSlot(reservation.client_ip.clone(), index),
                    expires_at,
                );
            }
        }
        drop(store);

        self.metrics.rolled_back.inc();
        debug!(
            address = %reservation.address,
            client_ip = %reservation.client_ip,
            status = status.as_u16(),
            "Claim failed, rate limit entries released"
        );
    }

    /// Purge expired entries (called periodically). Returns the number purged.
    pub async fn cleanup(&self) -> usize {
        self.store.lock().await.purge_expired()
    }

    /// Entries currently held, expired ones included until the next cleanup.
    pub async fn tracked_entries(&self) -> usize {
        self.store.lock().await.len()
    }
}

#[async_trait]
impl RequestGate for RateLimiter {
    type Receipt = Option<Reservation>;

    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn evaluate(
        &self,
        claim: &ClaimContext,
        headers: &HeaderMap,
    ) -> Result<Self::Receipt, Rejection> {
        let client_ip = client_ip::resolve(self.proxy_count, headers, &claim.remote_addr);

        match self.check(&claim.address, &client_ip).await {
            RateLimitResult::Allowed(reservation) => Ok(reservation),
            RateLimitResult::Limited {
                reason,
                retry_after,
            } => {
                let wait = reason.rounded_wait(retry_after);
                info!(
                    address = %claim.address,
                    %client_ip,
                    reason = %reason,
                    retry_after_secs = wait.as_secs(),
                    "Claim rate limited"
                );
                Err(Rejection::too_many_requests(limit_message(wait)))
            }
        }
    }

    async fn settle(&self, receipt: Self::Receipt, status: StatusCode) {
        if let Some(reservation) = receipt {
            self.observe(reservation, status).await;
        }
    }
}
