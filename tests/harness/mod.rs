// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for claim abuse simulation.
//!
//! This module provides utilities for replaying abusive claim patterns
//! against the rate limiter to validate its controls.

pub mod attacks;
pub mod generators;
pub mod metrics;
