// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub nickname: String,
    pub role: String,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct BondProduct {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub rate: f64,
    pub min_days: i64,
}

/// Owned bond. `name`, `rate` and `min_days` are snapshots taken at
/// purchase time.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HoldingRecord {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub principal: f64,
    pub rate: f64,
    pub min_days: i64,
    pub created_at: DateTime<Utc>,
    pub can_withdraw: bool,
}

/// Holding joined with its owner's nickname, for the admin registry.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedHoldingRecord {
    pub id: i64,
    pub user_id: String,
    pub nickname: Option<String>,
    pub name: String,
    pub principal: f64,
    pub rate: f64,
    pub min_days: i64,
    pub created_at: DateTime<Utc>,
    pub can_withdraw: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct BalanceEntry {
    pub user_id: String,
    pub nickname: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct DirectoryEntry {
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(rename = "nick")]
    pub nickname: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WithdrawalRecord {
    pub id: i64,
    pub user_id: String,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
}
