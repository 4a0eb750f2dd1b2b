// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::DECIDED_CACHE_LEN;
use crate::common::error::LedgerError;
use crate::common::seen_cache::BoundedSeenSet;
use crate::data::db::{Database, WriteTx};
use crate::data::schema::{
    BalanceEntry, BondProduct, DirectoryEntry, HoldingRecord, UserRecord,
};
use crate::infrastructure::notify::{Notification, Notifier};
use crate::services::ledger::accrual::current_value;
use crate::services::ledger::admin::AdminPolicy;
use crate::services::ledger::view::{HoldingView, OwnedHoldingView, UserView};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub holding_id: i64,
    pub name: String,
    pub principal: f64,
    pub payout: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub from_balance: f64,
}

/// The only component that moves money. Every mutation runs inside one
/// store write transaction, so a failure at any step leaves balances and
/// holdings as they were.
#[derive(Clone)]
pub struct LedgerEngine {
    db: Database,
    admins: Arc<AdminPolicy>,
    notifier: Notifier,
    pub(crate) decided: Arc<BoundedSeenSet<i64>>,
}

pub(crate) fn validate_amount(field: &str, amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::validation(field, "must be a finite number"));
    }
    if amount <= 0.0 {
        return Err(LedgerError::validation(field, "must be positive"));
    }
    Ok(())
}

pub(crate) async fn ensure_not_banned(tx: &mut WriteTx, user_id: &str) -> Result<(), LedgerError> {
    if let Some(user) = tx.user(user_id).await?
        && user.banned
    {
        return Err(LedgerError::Banned(user_id.to_string()));
    }
    Ok(())
}

impl LedgerEngine {
    pub fn new(db: Database, admins: AdminPolicy, notifier: Notifier) -> Self {
        Self {
            db,
            admins: Arc::new(admins),
            notifier,
            decided: Arc::new(BoundedSeenSet::new(DECIDED_CACHE_LEN)),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.is_admin(identity)
    }

    pub(crate) fn require_admin(&self, identity: &str) -> Result<(), LedgerError> {
        self.admins.require(identity)
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    pub async fn register(
        &self,
        user_id: &str,
        nickname: &str,
        role: &str,
    ) -> Result<UserRecord, LedgerError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(LedgerError::validation("user_id", "must not be empty"));
        }
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(LedgerError::validation("nickname", "must not be empty"));
        }
        let user = self
            .db
            .register_user(user_id, nickname, role.trim(), Utc::now())
            .await?;
        tracing::info!(target: "ledger", user = %user.user_id, nickname = %user.nickname, "User registered");
        Ok(user)
    }

    /// Buy `amount` worth of product `product_id`. The holding snapshots the
    /// product's name, rate and minimum holding days.
    pub async fn purchase(
        &self,
        user_id: &str,
        product_id: i64,
        amount: f64,
    ) -> Result<HoldingRecord, LedgerError> {
        validate_amount("amount", amount)?;

        let mut tx = self.db.begin_write().await?;
        ensure_not_banned(&mut tx, user_id).await?;
        let product = tx
            .product(product_id)
            .await?
            .ok_or(LedgerError::UnknownProduct(product_id))?;
        if amount < product.price {
            return Err(LedgerError::BelowMinimum {
                amount,
                minimum: product.price,
            });
        }
        tx.debit(user_id, amount).await?;
        let holding = tx
            .insert_holding(
                user_id,
                &product.name,
                amount,
                product.rate,
                product.min_days,
                Utc::now(),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            target: "ledger",
            user = %user_id,
            product = %product.name,
            holding = holding.id,
            amount,
            "Bond purchased"
        );
        self.notify(Notification::InvestmentOpened {
            user_id: user_id.to_string(),
            holding_id: holding.id,
            product: product.name,
            amount,
        });
        Ok(holding)
    }

    /// Pay out the current value of an unlocked holding and delete it. Value,
    /// credit and delete share one transaction.
    pub async fn redeem(&self, user_id: &str, holding_id: i64) -> Result<Redemption, LedgerError> {
        let mut tx = self.db.begin_write().await?;
        ensure_not_banned(&mut tx, user_id).await?;
        let holding = tx
            .owned_holding(holding_id, user_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Bond {holding_id}")))?;
        if !holding.can_withdraw {
            return Err(LedgerError::Locked(holding_id));
        }

        let payout = current_value(holding.principal, holding.rate, holding.created_at, Utc::now());
        tx.credit(user_id, payout).await?;
        if !tx.delete_holding(holding_id).await? {
            return Err(LedgerError::NotFound(format!("Bond {holding_id}")));
        }
        let balance = tx.balance(user_id).await?;
        tx.commit().await?;

        tracing::info!(
            target: "ledger",
            user = %user_id,
            holding = holding_id,
            principal = holding.principal,
            payout,
            "Bond redeemed"
        );
        Ok(Redemption {
            holding_id,
            name: holding.name,
            principal: holding.principal,
            payout,
            balance,
        })
    }

    /// Move `amount` from `from` to a registered recipient as one unit.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<TransferReceipt, LedgerError> {
        validate_amount("amount", amount)?;
        let from = from.trim();
        let to = to.trim();
        if from == to {
            return Err(LedgerError::validation("target_id", "cannot transfer to yourself"));
        }

        let mut tx = self.db.begin_write().await?;
        ensure_not_banned(&mut tx, from).await?;
        if tx.user(to).await?.is_none() {
            return Err(LedgerError::NotFound(format!("User {to}")));
        }
        tx.debit(from, amount).await?;
        tx.credit(to, amount).await?;
        let from_balance = tx.balance(from).await?;
        tx.commit().await?;

        tracing::info!(target: "ledger", %from, %to, amount, "Transfer completed");
        self.notify(Notification::TransferReceived {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(TransferReceipt {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            from_balance,
        })
    }

    /// Admin top-up. Returns the new balance.
    pub async fn deposit(
        &self,
        admin: &str,
        user_id: &str,
        amount: f64,
    ) -> Result<f64, LedgerError> {
        self.require_admin(admin)?;
        validate_amount("amount", amount)?;
        let balance = self.apply_delta(user_id, amount).await?;
        tracing::info!(target: "ledger", %admin, user = %user_id, amount, balance, "Deposit credited");
        Ok(balance)
    }

    /// Admin correction without a sufficiency check; may leave the balance
    /// negative.
    pub async fn adjust_balance(
        &self,
        admin: &str,
        user_id: &str,
        delta: f64,
    ) -> Result<f64, LedgerError> {
        self.require_admin(admin)?;
        if !delta.is_finite() || delta == 0.0 {
            return Err(LedgerError::validation("delta", "must be a non-zero finite number"));
        }
        let balance = self.apply_delta(user_id, delta).await?;
        tracing::info!(target: "ledger", %admin, user = %user_id, delta, balance, "Balance adjusted");
        Ok(balance)
    }

    async fn apply_delta(&self, user_id: &str, delta: f64) -> Result<f64, LedgerError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(LedgerError::validation("user_id", "must not be empty"));
        }
        let mut tx = self.db.begin_write().await?;
        tx.credit(user_id, delta).await?;
        let balance = tx.balance(user_id).await?;
        tx.commit().await?;
        Ok(balance)
    }

    pub async fn create_product(
        &self,
        admin: &str,
        name: &str,
        price: f64,
        rate: f64,
        min_days: i64,
    ) -> Result<BondProduct, LedgerError> {
        self.require_admin(admin)?;
        let product = self.db.create_product(name, price, rate, min_days).await?;
        tracing::info!(
            target: "ledger",
            %admin,
            id = product.id,
            name = %product.name,
            price,
            rate,
            min_days,
            "Bond product listed"
        );
        Ok(product)
    }

    pub async fn remove_product(&self, admin: &str, product_id: i64) -> Result<(), LedgerError> {
        self.require_admin(admin)?;
        if !self.db.remove_product(product_id).await? {
            return Err(LedgerError::UnknownProduct(product_id));
        }
        tracing::info!(target: "ledger", %admin, id = product_id, "Bond product delisted");
        Ok(())
    }

    /// The only way a holding becomes redeemable.
    pub async fn set_lock(
        &self,
        admin: &str,
        holding_id: i64,
        unlocked: bool,
    ) -> Result<(), LedgerError> {
        self.require_admin(admin)?;
        if !self.db.set_lock(holding_id, unlocked).await? {
            return Err(LedgerError::NotFound(format!("Bond {holding_id}")));
        }
        tracing::info!(target: "ledger", %admin, holding = holding_id, unlocked, "Redemption lock changed");
        Ok(())
    }

    pub async fn set_banned(&self, admin: &str, user_id: &str, banned: bool) -> Result<(), LedgerError> {
        self.require_admin(admin)?;
        if !self.db.set_banned(user_id, banned).await? {
            return Err(LedgerError::NotFound(format!("User {user_id}")));
        }
        tracing::info!(target: "ledger", %admin, user = %user_id, banned, "Ban flag changed");
        Ok(())
    }

    pub async fn set_info(&self, admin: &str, text: &str) -> Result<(), LedgerError> {
        self.require_admin(admin)?;
        self.db.set_info_line(text.trim()).await
    }

    pub async fn balance(&self, user_id: &str) -> Result<f64, LedgerError> {
        self.db.get_balance(user_id).await
    }

    pub async fn catalog(&self) -> Result<Vec<BondProduct>, LedgerError> {
        self.db.list_products().await
    }

    pub async fn holdings(&self, user_id: &str) -> Result<Vec<HoldingView>, LedgerError> {
        let now = Utc::now();
        Ok(self
            .db
            .list_holdings(user_id)
            .await?
            .iter()
            .map(|h| HoldingView::at(h, now))
            .collect())
    }

    pub async fn directory(&self) -> Result<Vec<DirectoryEntry>, LedgerError> {
        self.db.directory().await
    }

    /// Read document for one user. Reads are independent queries and take
    /// no write lock.
    pub async fn user_view(&self, user_id: &str) -> Result<UserView, LedgerError> {
        let (user, balance, holdings, catalog, info) = futures::try_join!(
            self.db.user(user_id),
            self.db.get_balance(user_id),
            self.holdings(user_id),
            self.db.list_products(),
            self.db.info_line(),
        )?;
        Ok(UserView {
            user_id: user_id.to_string(),
            registered: user.is_some(),
            nickname: user.as_ref().map(|u| u.nickname.clone()),
            role: user.map(|u| u.role),
            balance,
            info,
            holdings,
            catalog,
        })
    }

    pub async fn all_holdings(&self, admin: &str) -> Result<Vec<OwnedHoldingView>, LedgerError> {
        self.require_admin(admin)?;
        let now = Utc::now();
        Ok(self
            .db
            .all_holdings()
            .await?
            .into_iter()
            .map(|h| OwnedHoldingView::at(h, now))
            .collect())
    }

    pub async fn all_balances(&self, admin: &str) -> Result<Vec<BalanceEntry>, LedgerError> {
        self.require_admin(admin)?;
        self.db.all_balances().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn engine() -> LedgerEngine {
        let db = Database::new("sqlite::memory:").await.expect("db");
        LedgerEngine::new(db, AdminPolicy::new(["admin"]), Notifier::disabled())
    }

    #[tokio::test]
    async fn purchase_checks_product_then_minimum_then_funds() {
        let engine = engine().await;
        engine.deposit("admin", "alice", 50.0).await.unwrap();
        let product = engine
            .create_product("admin", "Crown", 40.0, 2.0, 3)
            .await
            .unwrap();

        assert_eq!(
            engine.purchase("alice", product.id + 1, 45.0).await,
            Err(LedgerError::UnknownProduct(product.id + 1))
        );
        assert_eq!(
            engine.purchase("alice", product.id, 39.99).await,
            Err(LedgerError::BelowMinimum {
                amount: 39.99,
                minimum: 40.0
            })
        );
        assert_eq!(
            engine.purchase("alice", product.id, 60.0).await,
            Err(LedgerError::InsufficientFunds {
                required: 60.0,
                available: 50.0
            })
        );
        assert_eq!(engine.balance("alice").await.unwrap(), 50.0);
        assert!(engine.holdings("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn holdings_keep_their_snapshot_after_delisting() {
        let engine = engine().await;
        engine.deposit("admin", "alice", 100.0).await.unwrap();
        let product = engine
            .create_product("admin", "Crown", 40.0, 2.0, 3)
            .await
            .unwrap();
        let holding = engine.purchase("alice", product.id, 40.0).await.unwrap();
        engine.remove_product("admin", product.id).await.unwrap();

        let views = engine.holdings("alice").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, holding.id);
        assert_eq!(views[0].name, "Crown");
        assert_eq!(views[0].rate, 2.0);
        assert_eq!(holding.min_days, 3);
    }

    #[tokio::test]
    async fn admin_operations_reject_non_admins() {
        let engine = engine().await;
        assert!(matches!(
            engine.deposit("alice", "alice", 1_000.0).await,
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(
            engine.create_product("alice", "Free money", 0.0, 100.0, 0).await,
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(
            engine.set_lock("alice", 1, true).await,
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(
            engine.all_balances("alice").await,
            Err(LedgerError::Unauthorized(_))
        ));
        assert_eq!(engine.balance("alice").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn adjust_may_go_negative_but_deposit_must_be_positive() {
        let engine = engine().await;
        assert_eq!(engine.adjust_balance("admin", "bob", -5.0).await.unwrap(), -5.0);
        assert!(matches!(
            engine.deposit("admin", "bob", -5.0).await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            engine.adjust_balance("admin", "bob", f64::NAN).await,
            Err(LedgerError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn banned_users_cannot_move_money() {
        let engine = engine().await;
        engine.register("alice", "Alice", "").await.unwrap();
        engine.register("bob", "Bob", "").await.unwrap();
        engine.deposit("admin", "alice", 20.0).await.unwrap();
        engine.set_banned("admin", "alice", true).await.unwrap();

        assert_eq!(
            engine.transfer("alice", "bob", 5.0).await,
            Err(LedgerError::Banned("alice".into()))
        );
        engine.set_banned("admin", "alice", false).await.unwrap();
        assert!(engine.transfer("alice", "bob", 5.0).await.is_ok());
    }

    #[tokio::test]
    async fn user_view_combines_balance_holdings_catalog_and_info() {
        let engine = engine().await;
        engine.register("alice", "Alice", "Miner").await.unwrap();
        engine.deposit("admin", "alice", 100.0).await.unwrap();
        let product = engine
            .create_product("admin", "Crown", 40.0, 2.0, 3)
            .await
            .unwrap();
        engine.purchase("alice", product.id, 40.0).await.unwrap();
        engine.set_info("admin", "  Market opens at noon ").await.unwrap();

        let view = engine.user_view("alice").await.unwrap();
        assert!(view.registered);
        assert_eq!(view.nickname.as_deref(), Some("Alice"));
        assert_eq!(view.balance, 60.0);
        assert_eq!(view.info, "Market opens at noon");
        assert_eq!(view.holdings.len(), 1);
        assert_eq!(view.holdings[0].current_value, 40.0);
        assert_eq!(view.catalog, vec![product]);

        let stranger = engine.user_view("nobody").await.unwrap();
        assert!(!stranger.registered);
        assert_eq!(stranger.balance, 0.0);
    }
}
