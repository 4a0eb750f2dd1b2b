// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::BondProduct;

fn require_finite(field: &str, value: f64) -> Result<(), LedgerError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LedgerError::validation(field, "must be a finite number"))
    }
}

impl Database {
    pub async fn list_products(&self) -> Result<Vec<BondProduct>, LedgerError> {
        let rows = sqlx::query_as::<_, BondProduct>(
            "SELECT id, name, price, rate, min_days FROM bond_products ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn product(&self, id: i64) -> Result<Option<BondProduct>, LedgerError> {
        let row = sqlx::query_as::<_, BondProduct>(
            "SELECT id, name, price, rate, min_days FROM bond_products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Rate sign and price are not policed beyond finiteness; the catalog is
    /// admin-curated.
    pub async fn create_product(
        &self,
        name: &str,
        price: f64,
        rate: f64,
        min_days: i64,
    ) -> Result<BondProduct, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("name", "must not be empty"));
        }
        require_finite("price", price)?;
        require_finite("rate", rate)?;
        if min_days < 0 {
            return Err(LedgerError::validation("min_days", "must not be negative"));
        }

        let mut tx = self.begin_write().await?;
        let product = sqlx::query_as::<_, BondProduct>(
            r#"
            INSERT INTO bond_products (name, price, rate, min_days)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, price, rate, min_days
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(rate)
        .bind(min_days)
        .fetch_one(tx.conn())
        .await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Returns false when nothing was deleted. Holdings bought from the
    /// product keep their snapshot.
    pub async fn remove_product(&self, id: i64) -> Result<bool, LedgerError> {
        let mut tx = self.begin_write().await?;
        let result = sqlx::query("DELETE FROM bond_products WHERE id = ?")
            .bind(id)
            .execute(tx.conn())
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl WriteTx {
    pub async fn product(&mut self, id: i64) -> Result<Option<BondProduct>, LedgerError> {
        let row = sqlx::query_as::<_, BondProduct>(
            "SELECT id, name, price, rate, min_days FROM bond_products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn products_are_listed_in_insertion_order_and_removable() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        let first = db.create_product("Crown", 40.0, 2.0, 3).await.unwrap();
        let second = db.create_product("Viking", 100.0, 0.5, 0).await.unwrap();

        let listed = db.list_products().await.unwrap();
        assert_eq!(listed, vec![first.clone(), second.clone()]);

        assert!(db.remove_product(first.id).await.unwrap());
        assert!(!db.remove_product(first.id).await.unwrap());
        assert_eq!(db.list_products().await.unwrap(), vec![second]);
        assert!(db.product(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_finite_values_are_rejected() {
        let db = Database::new("sqlite::memory:").await.expect("db");
        assert!(matches!(
            db.create_product("Broken", f64::NAN, 1.0, 0).await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            db.create_product("Broken", 10.0, f64::INFINITY, 0).await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(db.list_products().await.unwrap().is_empty());
    }
}
