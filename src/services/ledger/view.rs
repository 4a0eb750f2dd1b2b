// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::PURCHASE_DATE_FORMAT;
use crate::data::schema::{BondProduct, HoldingRecord, OwnedHoldingRecord};
use crate::services::ledger::accrual::{current_value, elapsed_days};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingView {
    pub id: i64,
    pub name: String,
    pub principal: f64,
    pub rate: f64,
    pub current_value: f64,
    pub purchase_date: String,
    /// First day the product's minimum holding period is satisfied.
    pub matures_on: String,
    pub matured: bool,
    pub redeemable: bool,
}

impl HoldingView {
    pub fn at(record: &HoldingRecord, now: DateTime<Utc>) -> Self {
        let (matures_on, matured) = maturity(record.created_at, record.min_days, now);
        Self {
            id: record.id,
            name: record.name.clone(),
            principal: record.principal,
            rate: record.rate,
            current_value: current_value(record.principal, record.rate, record.created_at, now),
            purchase_date: record.created_at.format(PURCHASE_DATE_FORMAT).to_string(),
            matures_on,
            matured,
            redeemable: record.can_withdraw,
        }
    }
}

/// Admin registry row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedHoldingView {
    pub user_id: String,
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub holding: HoldingView,
}

impl OwnedHoldingView {
    pub fn at(record: OwnedHoldingRecord, now: DateTime<Utc>) -> Self {
        let holding = HoldingRecord {
            id: record.id,
            user_id: record.user_id.clone(),
            name: record.name,
            principal: record.principal,
            rate: record.rate,
            min_days: record.min_days,
            created_at: record.created_at,
            can_withdraw: record.can_withdraw,
        };
        Self {
            user_id: record.user_id,
            nickname: record.nickname,
            holding: HoldingView::at(&holding, now),
        }
    }
}

/// Per-user read document served to the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: String,
    pub registered: bool,
    pub nickname: Option<String>,
    pub role: Option<String>,
    pub balance: f64,
    pub info: String,
    pub holdings: Vec<HoldingView>,
    pub catalog: Vec<BondProduct>,
}

fn maturity(created_at: DateTime<Utc>, min_days: i64, now: DateTime<Utc>) -> (String, bool) {
    let min_days = min_days.max(0);
    let matures_on = Duration::try_days(min_days)
        .and_then(|d| created_at.checked_add_signed(d))
        .map(|date| date.format(PURCHASE_DATE_FORMAT).to_string())
        .unwrap_or_default();
    (matures_on, elapsed_days(created_at, now) >= min_days)
}
