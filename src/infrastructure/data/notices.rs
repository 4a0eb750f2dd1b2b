// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::NOTICE_ID;
use crate::common::error::LedgerError;
use crate::data::db::Database;

impl Database {
    /// Notice-board line; empty when never set.
    pub async fn info_line(&self) -> Result<String, LedgerError> {
        let text: Option<String> = sqlx::query_scalar("SELECT text FROM notices WHERE id = ?")
            .bind(NOTICE_ID)
            .fetch_optional(self.pool())
            .await?;
        Ok(text.unwrap_or_default())
    }

    pub async fn set_info_line(&self, text: &str) -> Result<(), LedgerError> {
        let mut tx = self.begin_write().await?;
        sqlx::query(
            r#"
            INSERT INTO notices (id, text) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET text = excluded.text
            "#,
        )
        .bind(NOTICE_ID)
        .bind(text)
        .execute(tx.conn())
        .await?;
        tx.commit().await
    }
}
