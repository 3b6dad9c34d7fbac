// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for attack simulation results.

use std::collections::HashMap;

/// Collects outcomes during attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Count of claims by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of claims by client IP
    requests_per_ip: HashMap<String, usize>,
}

/// Possible outcomes for a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    LimitedAddress,
    LimitedClient,
    Malformed,
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
    }

    /// Get total claim count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get number of unique IPs that made claims.
    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Get block rate (ratio of blocked to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Allowed)) as f64 / total as f64
    }
}

impl std::fmt::Display for AttackMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Attack Metrics Report ===")?;
        writeln!(f, "Total Claims:      {}", self.total_requests())?;
        writeln!(f, "Allowed:           {}", self.count(Outcome::Allowed))?;
        writeln!(f, "Limited (Address): {}", self.count(Outcome::LimitedAddress))?;
        writeln!(f, "Limited (Client):  {}", self.count(Outcome::LimitedClient))?;
        writeln!(f, "Malformed:         {}", self.count(Outcome::Malformed))?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate() * 100.0)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips())?;
        Ok(())
    }
}
