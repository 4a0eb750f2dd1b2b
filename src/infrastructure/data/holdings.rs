// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::{HoldingRecord, OwnedHoldingRecord};
use chrono::{DateTime, Utc};

const HOLDING_COLUMNS: &str =
    "id, user_id, name, principal, rate, min_days, created_at, can_withdraw";

impl Database {
    pub async fn list_holdings(&self, user_id: &str) -> Result<Vec<HoldingRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, HoldingRecord>(&format!(
            "SELECT {HOLDING_COLUMNS} FROM bond_holdings WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn holding(&self, id: i64) -> Result<Option<HoldingRecord>, LedgerError> {
        let row = sqlx::query_as::<_, HoldingRecord>(&format!(
            "SELECT {HOLDING_COLUMNS} FROM bond_holdings WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Every holding with its owner's nickname, oldest first.
    pub async fn all_holdings(&self) -> Result<Vec<OwnedHoldingRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, OwnedHoldingRecord>(
            r#"
            SELECT h.id, h.user_id, u.nickname, h.name, h.principal, h.rate,
                   h.min_days, h.created_at, h.can_withdraw
            FROM bond_holdings h
            LEFT JOIN users u ON u.user_id = h.user_id
            ORDER BY h.id
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// New holdings start locked.
    pub async fn add_holding(
        &self,
        user_id: &str,
        name: &str,
        principal: f64,
        rate: f64,
        min_days: i64,
        created_at: DateTime<Utc>,
    ) -> Result<HoldingRecord, LedgerError> {
        let mut tx = self.begin_write().await?;
        let holding = tx
            .insert_holding(user_id, name, principal, rate, min_days, created_at)
            .await?;
        tx.commit().await?;
        Ok(holding)
    }

    pub async fn remove_holding(&self, id: i64) -> Result<bool, LedgerError> {
        let mut tx = self.begin_write().await?;
        let removed = tx.delete_holding(id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Toggle `can_withdraw`. Returns false for an unknown holding.
    pub async fn set_lock(&self, id: i64, unlocked: bool) -> Result<bool, LedgerError> {
        let mut tx = self.begin_write().await?;
        let result = sqlx::query("UPDATE bond_holdings SET can_withdraw = ? WHERE id = ?")
            .bind(unlocked)
            .bind(id)
            .execute(tx.conn())
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl WriteTx {
    pub async fn insert_holding(
        &mut self,
        user_id: &str,
        name: &str,
        principal: f64,
        rate: f64,
        min_days: i64,
        created_at: DateTime<Utc>,
    ) -> Result<HoldingRecord, LedgerError> {
        let row = sqlx::query_as::<_, HoldingRecord>(&format!(
            r#"
            INSERT INTO bond_holdings
                (user_id, name, principal, rate, min_days, created_at, can_withdraw)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            RETURNING {HOLDING_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(principal)
        .bind(rate)
        .bind(min_days)
        .bind(created_at)
        .fetch_one(self.conn())
        .await?;
        Ok(row)
    }

    /// Holding `id` if it belongs to `user_id`.
    pub async fn owned_holding(
        &mut self,
        id: i64,
        user_id: &str,
    ) -> Result<Option<HoldingRecord>, LedgerError> {
        let row = sqlx::query_as::<_, HoldingRecord>(&format!(
            "SELECT {HOLDING_COLUMNS} FROM bond_holdings WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.conn())
        .await?;
        Ok(row)
    }

    pub async fn delete_holding(&mut self, id: i64) -> Result<bool, LedgerError> {
        let result = sqlx::query("DELETE FROM bond_holdings WHERE id = ?")
            .bind(id)
            .execute(self.conn())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
