// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

/// Accrual stops growing after this many whole days.
pub const MAX_ACCRUAL_DAYS: i64 = 365;

pub const HOURS_PER_DAY: f64 = 24.0;

/// Purchase date as shown to users (day.month.year).
pub const PURCHASE_DATE_FORMAT: &str = "%d.%m.%Y";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://gold_ledger.db";

/// Row id of the single notice-board line.
pub const NOTICE_ID: i64 = 1;

/// Prefix of the correlation token attached to withdrawal decision prompts.
pub const WITHDRAWAL_TOKEN_PREFIX: &str = "wd:";

/// Bound on the in-process cache of already decided withdrawal ids.
pub const DECIDED_CACHE_LEN: usize = 4_096;

pub const STATUS_REQUESTED: &str = "requested";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_ABANDONED: &str = "abandoned";
