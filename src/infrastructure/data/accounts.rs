// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::BalanceEntry;
use sqlx::SqliteConnection;

async fn fetch_balance(conn: &mut SqliteConnection, user_id: &str) -> Result<f64, LedgerError> {
    let amount: Option<f64> = sqlx::query_scalar("SELECT amount FROM balances WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(amount.unwrap_or(0.0))
}

async fn upsert_balance(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: f64,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO balances (user_id, amount)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET amount = excluded.amount
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn add_to_balance(
    conn: &mut SqliteConnection,
    user_id: &str,
    delta: f64,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO balances (user_id, amount)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET amount = balances.amount + excluded.amount
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Single-statement debit; matches no row when the balance is short.
async fn subtract_if_sufficient(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: f64,
) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE balances
        SET amount = amount - ?
        WHERE user_id = ? AND amount >= ?
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

impl Database {
    /// Missing records read as zero.
    pub async fn get_balance(&self, user_id: &str) -> Result<f64, LedgerError> {
        let mut conn = self.pool().acquire().await?;
        fetch_balance(&mut conn, user_id).await
    }

    /// Last-writer-wins upsert. Engine code moves money with the delta
    /// primitives on `WriteTx` instead.
    pub async fn set_balance(&self, user_id: &str, amount: f64) -> Result<(), LedgerError> {
        let mut tx = self.begin_write().await?;
        tx.set_balance(user_id, amount).await?;
        tx.commit().await
    }

    pub async fn all_balances(&self) -> Result<Vec<BalanceEntry>, LedgerError> {
        let rows = sqlx::query_as::<_, BalanceEntry>(
            r#"
            SELECT b.user_id, u.nickname, b.amount
            FROM balances b
            LEFT JOIN users u ON u.user_id = b.user_id
            ORDER BY COALESCE(u.nickname, b.user_id)
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}

impl WriteTx {
    pub async fn balance(&mut self, user_id: &str) -> Result<f64, LedgerError> {
        fetch_balance(self.conn(), user_id).await
    }

    pub async fn set_balance(&mut self, user_id: &str, amount: f64) -> Result<(), LedgerError> {
        upsert_balance(self.conn(), user_id, amount).await
    }

    /// Unconditional delta; creates the record on first touch.
    pub async fn credit(&mut self, user_id: &str, delta: f64) -> Result<(), LedgerError> {
        add_to_balance(self.conn(), user_id, delta).await
    }

    /// Debit `amount` or fail with `InsufficientFunds`, leaving the balance as
    /// it was.
    pub async fn debit(&mut self, user_id: &str, amount: f64) -> Result<(), LedgerError> {
        if subtract_if_sufficient(self.conn(), user_id, amount).await? {
            return Ok(());
        }
        let available = fetch_balance(self.conn(), user_id).await?;
        Err(LedgerError::InsufficientFunds {
            required: amount,
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_balance_reads_as_zero() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        assert_eq!(db.get_balance("nobody").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn set_balance_is_an_idempotent_upsert() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        db.set_balance("alice", 10.0).await.unwrap();
        db.set_balance("alice", 10.0).await.unwrap();
        assert_eq!(db.get_balance("alice").await.unwrap(), 10.0);
        db.set_balance("alice", 3.5).await.unwrap();
        assert_eq!(db.get_balance("alice").await.unwrap(), 3.5);
        assert_eq!(db.all_balances().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn debit_refuses_to_go_negative() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        db.set_balance("alice", 30.0).await.unwrap();

        let mut tx = db.begin_write().await.unwrap();
        tx.debit("alice", 30.0).await.expect("exact balance debits");
        let err = tx.debit("alice", 0.01).await.expect_err("empty account");
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: 0.01,
                available: 0.0
            }
        );
        tx.commit().await.unwrap();
        assert_eq!(db.get_balance("alice").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn debit_of_unknown_account_is_insufficient() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        let mut tx = db.begin_write().await.unwrap();
        assert!(matches!(
            tx.debit("ghost", 1.0).await,
            Err(LedgerError::InsufficientFunds { .. })
        ));
    }
}
