// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use chrono::{Duration, Utc};
use gold_ledger::domain::error::LedgerError;
use gold_ledger::infrastructure::data::db::Database;
use gold_ledger::infrastructure::notify::{Notification, Notifier};
use gold_ledger::services::ledger::{AdminPolicy, LedgerEngine, UserAction};

const ADMIN: &str = "1000001";

async fn engine() -> LedgerEngine {
    let db = Database::new("sqlite::memory:").await.expect("db");
    LedgerEngine::new(db, AdminPolicy::new([ADMIN]), Notifier::disabled())
}

async fn registered(engine: &LedgerEngine, id: &str, nick: &str, balance: f64) {
    engine.register(id, nick, "member").await.expect("register");
    if balance > 0.0 {
        engine.deposit(ADMIN, id, balance).await.expect("deposit");
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[tokio::test]
async fn three_day_old_bond_pays_compound_interest() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 60.0).await;

    let created = Utc::now() - Duration::days(3) - Duration::minutes(1);
    let holding = engine
        .db()
        .add_holding("alice", "Crown", 40.0, 2.0, 3, created)
        .await
        .expect("holding");
    assert_eq!(
        engine.redeem("alice", holding.id).await,
        Err(LedgerError::Locked(holding.id))
    );

    engine.set_lock(ADMIN, holding.id, true).await.expect("unlock");
    let redemption = engine.redeem("alice", holding.id).await.expect("redeem");

    assert!(approx(redemption.payout, 42.44832));
    assert!(approx(redemption.balance, 102.44832));
    assert!(approx(engine.balance("alice").await.unwrap(), 102.44832));
    assert!(engine.holdings("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn same_day_redemption_returns_the_principal() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 100.0).await;
    let product = engine
        .create_product(ADMIN, "Crown", 40.0, 2.0, 3)
        .await
        .unwrap();

    let holding = engine.purchase("alice", product.id, 40.0).await.unwrap();
    assert!(!holding.can_withdraw);
    assert!(approx(engine.balance("alice").await.unwrap(), 60.0));

    engine.set_lock(ADMIN, holding.id, true).await.unwrap();
    let redemption = engine.redeem("alice", holding.id).await.unwrap();
    assert!(approx(redemption.payout, 40.0));
    assert!(approx(engine.balance("alice").await.unwrap(), 100.0));

    assert_eq!(
        engine.redeem("alice", holding.id).await,
        Err(LedgerError::NotFound(format!("Bond {}", holding.id)))
    );
}

#[tokio::test]
async fn locked_redeem_leaves_everything_in_place() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 100.0).await;
    let product = engine
        .create_product(ADMIN, "Crown", 40.0, 2.0, 3)
        .await
        .unwrap();
    let holding = engine.purchase("alice", product.id, 50.0).await.unwrap();

    assert_eq!(
        engine.redeem("alice", holding.id).await,
        Err(LedgerError::Locked(holding.id))
    );
    assert!(approx(engine.balance("alice").await.unwrap(), 50.0));
    let holdings = engine.holdings("alice").await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert!(!holdings[0].redeemable);
}

#[tokio::test]
async fn steep_negative_rate_cannot_overdraw_on_redeem() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 10.0).await;

    let created = Utc::now() - Duration::days(1) - Duration::minutes(1);
    let holding = engine
        .db()
        .add_holding("alice", "Sinker", 10.0, -250.0, 0, created)
        .await
        .unwrap();
    engine.set_lock(ADMIN, holding.id, true).await.unwrap();

    let redemption = engine.redeem("alice", holding.id).await.unwrap();
    assert_eq!(redemption.payout, 0.0);
    assert!(approx(engine.balance("alice").await.unwrap(), 10.0));
    assert!(engine.holdings("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn someone_elses_bond_is_not_found() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 0.0).await;
    let holding = engine
        .db()
        .add_holding("bob", "Crown", 40.0, 2.0, 3, Utc::now())
        .await
        .unwrap();
    engine.set_lock(ADMIN, holding.id, true).await.unwrap();

    assert!(matches!(
        engine.redeem("alice", holding.id).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(engine.db().holding(holding.id).await.unwrap().is_some());
}

#[tokio::test]
async fn overdrawn_transfer_changes_nothing() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 50.0).await;
    registered(&engine, "bob", "Bob", 10.0).await;

    assert_eq!(
        engine.transfer("alice", "bob", 70.0).await,
        Err(LedgerError::InsufficientFunds {
            required: 70.0,
            available: 50.0
        })
    );
    assert!(approx(engine.balance("alice").await.unwrap(), 50.0));
    assert!(approx(engine.balance("bob").await.unwrap(), 10.0));

    let receipt = engine.transfer("alice", "bob", 50.0).await.unwrap();
    assert!(approx(receipt.from_balance, 0.0));
    assert!(approx(engine.balance("bob").await.unwrap(), 60.0));
}

#[tokio::test]
async fn transfer_needs_a_registered_recipient() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 50.0).await;

    assert_eq!(
        engine.transfer("alice", "nobody", 5.0).await,
        Err(LedgerError::NotFound("User nobody".into()))
    );
    assert!(matches!(
        engine.transfer("alice", "alice", 5.0).await,
        Err(LedgerError::Validation { .. })
    ));
    assert!(matches!(
        engine.transfer(" alice ", "alice", 5.0).await,
        Err(LedgerError::Validation { .. })
    ));
    assert!(matches!(
        engine.transfer("alice", "bob", -5.0).await,
        Err(LedgerError::Validation { .. })
    ));
    assert!(approx(engine.balance("alice").await.unwrap(), 50.0));
    assert!(approx(engine.balance("nobody").await.unwrap(), 0.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_conserve_the_total() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 100.0).await;
    registered(&engine, "bob", "Bob", 100.0).await;

    let mut tasks = Vec::new();
    for i in 0..40 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 {
                ("alice", "bob")
            } else {
                ("bob", "alice")
            };
            // Declines are fine; partial application is not.
            let _ = engine.transfer(from, to, 15.0).await;
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    let alice = engine.balance("alice").await.unwrap();
    let bob = engine.balance("bob").await.unwrap();
    assert!(alice >= 0.0 && bob >= 0.0);
    assert!(approx(alice + bob, 200.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_never_overdraw() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 100.0).await;
    let product = engine
        .create_product(ADMIN, "Crown", 30.0, 1.0, 0)
        .await
        .unwrap();
    let product_id = product.id;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.purchase("alice", product_id, 30.0).await.is_ok()
        }));
    }
    let mut bought = 0;
    for task in tasks {
        if task.await.expect("join") {
            bought += 1;
        }
    }

    assert_eq!(bought, 3);
    assert!(approx(engine.balance("alice").await.unwrap(), 10.0));
    assert_eq!(engine.holdings("alice").await.unwrap().len(), 3);
}

#[tokio::test]
async fn front_end_actions_render_outcomes() {
    let (notifier, mut rx) = Notifier::channel();
    let db = Database::new("sqlite::memory:").await.expect("db");
    let engine = LedgerEngine::new(db, AdminPolicy::new([ADMIN]), notifier);
    registered(&engine, "bob", "Bob", 0.0).await;

    let outcome = engine
        .handle(
            "alice",
            UserAction::Register {
                nick: "Alice".into(),
                role: "member".into(),
            },
        )
        .await;
    assert!(outcome.ok, "{}", outcome.message);
    engine.deposit(ADMIN, "alice", 20.0).await.unwrap();

    let outcome = engine
        .handle(
            "alice",
            UserAction::Transfer {
                target_id: "bob".into(),
                amount: 25.0,
            },
        )
        .await;
    assert!(!outcome.ok);
    assert_eq!(
        outcome.message,
        "Insufficient funds. Required: 25.00, Available: 20.00"
    );

    let outcome = engine
        .handle(
            "alice",
            UserAction::Transfer {
                target_id: "bob".into(),
                amount: 5.0,
            },
        )
        .await;
    assert!(outcome.ok);
    assert_eq!(
        rx.try_recv().unwrap(),
        Notification::TransferReceived {
            from: "alice".into(),
            to: "bob".into(),
            amount: 5.0
        }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn banned_users_can_read_but_not_move_money() {
    let engine = engine().await;
    registered(&engine, "alice", "Alice", 50.0).await;
    registered(&engine, "bob", "Bob", 0.0).await;
    engine.set_banned(ADMIN, "alice", true).await.unwrap();

    assert_eq!(
        engine.transfer("alice", "bob", 5.0).await,
        Err(LedgerError::Banned("alice".into()))
    );
    assert_eq!(
        engine.request_withdrawal("alice", 5.0).await.map(|t| t.amount),
        Err(LedgerError::Banned("alice".into()))
    );
    assert!(approx(engine.user_view("alice").await.unwrap().balance, 50.0));

    engine.set_banned(ADMIN, "alice", false).await.unwrap();
    assert!(engine.transfer("alice", "bob", 5.0).await.is_ok());
}
