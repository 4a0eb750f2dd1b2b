// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Holding valuation. Values are always computed on demand from the stored
//! principal, rate and purchase time; nothing here touches the store.

use crate::common::constants::{HOURS_PER_DAY, MAX_ACCRUAL_DAYS};
use chrono::{DateTime, Utc};

/// Whole days between `created_at` and `now`. Negative when the purchase
/// timestamp lies in the future.
pub fn elapsed_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let hours = (now - created_at).num_seconds() as f64 / 3_600.0;
    (hours / HOURS_PER_DAY).floor() as i64
}

/// Daily discrete compounding over `days`, capped at `MAX_ACCRUAL_DAYS`.
/// Non-positive day counts and non-finite results yield the principal. A
/// value never drops below zero.
pub fn accrue(principal: f64, daily_rate_percent: f64, days: i64) -> f64 {
    if days <= 0 {
        return principal;
    }
    let days = days.min(MAX_ACCRUAL_DAYS) as i32;
    let value = principal * (1.0 + daily_rate_percent / 100.0).powi(days);
    if value.is_finite() { value.max(0.0) } else { principal }
}

pub fn current_value(
    principal: f64,
    daily_rate_percent: f64,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    accrue(principal, daily_rate_percent, elapsed_days(created_at, now))
}
