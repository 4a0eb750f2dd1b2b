// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::STATUS_REQUESTED;
use crate::common::error::LedgerError;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::WithdrawalRecord;
use crate::domain::types::WithdrawalStatus;
use chrono::{DateTime, Utc};

const WITHDRAWAL_COLUMNS: &str = "id, user_id, amount, status, created_at, decided_at, decided_by";

impl Database {
    pub async fn pending_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, WithdrawalRecord>(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE status = ? ORDER BY id"
        ))
        .bind(STATUS_REQUESTED)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn withdrawals_for(&self, user_id: &str) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, WithdrawalRecord>(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE user_id = ? ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}

impl WriteTx {
    pub async fn insert_withdrawal(
        &mut self,
        user_id: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalRecord, LedgerError> {
        let row = sqlx::query_as::<_, WithdrawalRecord>(&format!(
            r#"
            INSERT INTO withdrawal_requests (user_id, amount, status, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {WITHDRAWAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(amount)
        .bind(STATUS_REQUESTED)
        .bind(now)
        .fetch_one(self.conn())
        .await?;
        Ok(row)
    }

    /// Move a still-open request to `status`. `None` means the request is
    /// unknown or was already decided.
    pub async fn claim_withdrawal(
        &mut self,
        id: i64,
        status: WithdrawalStatus,
        decided_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WithdrawalRecord>, LedgerError> {
        let row = sqlx::query_as::<_, WithdrawalRecord>(&format!(
            r#"
            UPDATE withdrawal_requests
            SET status = ?, decided_at = ?, decided_by = ?
            WHERE id = ? AND status = ?
            RETURNING {WITHDRAWAL_COLUMNS}
            "#
        ))
        .bind(status.as_str())
        .bind(now)
        .bind(decided_by)
        .bind(id)
        .bind(STATUS_REQUESTED)
        .fetch_optional(self.conn())
        .await?;
        Ok(row)
    }

    pub async fn withdrawal(&mut self, id: i64) -> Result<Option<WithdrawalRecord>, LedgerError> {
        let row = sqlx::query_as::<_, WithdrawalRecord>(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.conn())
        .await?;
        Ok(row)
    }
}
