// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::retry_async;
use crate::domain::types::WithdrawalToken;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Admins,
    User(String),
}

/// Events emitted after a ledger transaction has committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    InvestmentOpened {
        user_id: String,
        holding_id: i64,
        product: String,
        amount: f64,
    },
    WithdrawalRequested {
        token: WithdrawalToken,
        user_id: String,
        nickname: Option<String>,
        amount: f64,
    },
    WithdrawalApproved {
        token: WithdrawalToken,
        user_id: String,
        amount: f64,
    },
    WithdrawalRejected {
        token: WithdrawalToken,
        user_id: String,
        amount: f64,
    },
    TransferReceived {
        from: String,
        to: String,
        amount: f64,
    },
}

impl Notification {
    pub fn recipient(&self) -> Recipient {
        match self {
            Notification::InvestmentOpened { .. } | Notification::WithdrawalRequested { .. } => {
                Recipient::Admins
            }
            Notification::WithdrawalApproved { user_id, .. }
            | Notification::WithdrawalRejected { user_id, .. } => Recipient::User(user_id.clone()),
            Notification::TransferReceived { to, .. } => Recipient::User(to.clone()),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notification::InvestmentOpened {
                user_id,
                holding_id,
                product,
                amount,
            } => format!("New investment #{holding_id}: {user_id} bought {product} for {amount:.2} GOLD"),
            Notification::WithdrawalRequested {
                token,
                user_id,
                nickname,
                amount,
            } => format!(
                "Withdrawal request {token}: {} wants {amount:.2} GOLD",
                nickname.as_deref().unwrap_or(user_id)
            ),
            Notification::WithdrawalApproved { amount, .. } => {
                format!("Your payout of {amount:.2} GOLD was approved")
            }
            Notification::WithdrawalRejected { amount, .. } => {
                format!("Your payout of {amount:.2} GOLD was rejected")
            }
            Notification::TransferReceived { from, amount, .. } => {
                format!("You received {amount:.2} GOLD from {from}")
            }
        }
    }
}

/// Delivery endpoint owned by the transport.
pub trait NotificationSink: Send + Sync + 'static {
    fn deliver(&self, notification: &Notification) -> Result<(), String>;
}

/// Sink that only writes to the log; used by the operator console.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &Notification) -> Result<(), String> {
        let recipient = match notification.recipient() {
            Recipient::Admins => "admins".to_string(),
            Recipient::User(id) => id,
        };
        tracing::info!(target: "notify", %recipient, "{}", notification.message());
        Ok(())
    }
}

/// Fire-and-forget handle. Sending never fails the caller.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, notification: Notification) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.send(notification) {
            tracing::warn!(
                target: "notify",
                recipient = ?e.0.recipient(),
                "Notification channel closed; dropping message"
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub attempts: usize,
    pub initial_delay: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(200),
        }
    }
}

/// Drain notifications into `sink` until the channel closes or `shutdown`
/// fires. Delivery failures are logged and swallowed.
pub fn spawn_dispatcher(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    sink: Arc<dyn NotificationSink>,
    policy: DeliveryPolicy,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => None,
                msg = rx.recv() => msg,
            };
            let Some(notification) = next else {
                break;
            };
            deliver(&sink, notification, policy).await;
        }
        tracing::debug!(target: "notify", "Notification dispatcher stopped");
    })
}

async fn deliver(
    sink: &Arc<dyn NotificationSink>,
    notification: Notification,
    policy: DeliveryPolicy,
) {
    let result = retry_async(
        |_| {
            let sink = sink.clone();
            let notification = notification.clone();
            async move { sink.deliver(&notification) }
        },
        policy.attempts,
        policy.initial_delay,
        |_| true,
    )
    .await;
    if let Err(e) = result {
        tracing::warn!(
            target: "notify",
            recipient = ?notification.recipient(),
            error = %e,
            "Notification delivery failed; dropping"
        );
    }
}
