// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::{DirectoryEntry, UserRecord};
use chrono::{DateTime, Utc};

const USER_COLUMNS: &str = "user_id, nickname, role, banned, created_at";

impl Database {
    /// Upsert the profile and make sure a balance record exists. An existing
    /// balance is never touched.
    pub async fn register_user(
        &self,
        user_id: &str,
        nickname: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, LedgerError> {
        let mut tx = self.begin_write().await?;
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (user_id, nickname, role, banned, created_at)
            VALUES (?, ?, ?, 0, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                nickname = excluded.nickname,
                role = excluded.role
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(nickname)
        .bind(role)
        .bind(now)
        .fetch_one(tx.conn())
        .await?;
        sqlx::query(
            "INSERT INTO balances (user_id, amount) VALUES (?, 0) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(tx.conn())
        .await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<UserRecord>, LedgerError> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn directory(&self) -> Result<Vec<DirectoryEntry>, LedgerError> {
        let rows = sqlx::query_as::<_, DirectoryEntry>(
            "SELECT user_id, nickname FROM users ORDER BY nickname, user_id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn set_banned(&self, user_id: &str, banned: bool) -> Result<bool, LedgerError> {
        let mut tx = self.begin_write().await?;
        let result = sqlx::query("UPDATE users SET banned = ? WHERE user_id = ?")
            .bind(banned)
            .bind(user_id)
            .execute(tx.conn())
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl WriteTx {
    pub async fn user(&mut self, user_id: &str) -> Result<Option<UserRecord>, LedgerError> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(self.conn())
        .await?;
        Ok(row)
    }
}
