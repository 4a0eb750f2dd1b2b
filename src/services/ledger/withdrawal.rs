// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Two-step cash-out protocol: `Requested -> {Approved, Rejected}`.
//!
//! A request is persisted with a server-issued id and the decision surface
//! only carries that id (`WithdrawalToken`). Requester and amount are read
//! back from the store at decision time, and the status change is a
//! conditional update, so a token can be used exactly once. An approval
//! that meets an insufficient balance ends in `Abandoned`.

use crate::common::error::LedgerError;
use crate::data::db::WriteTx;
use crate::data::schema::WithdrawalRecord;
use crate::domain::types::{Decision, WithdrawalStatus, WithdrawalToken};
use crate::infrastructure::notify::Notification;
use crate::services::ledger::engine::{LedgerEngine, ensure_not_banned, validate_amount};
use chrono::Utc;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalTicket {
    pub token: WithdrawalToken,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalOutcome {
    pub token: WithdrawalToken,
    pub user_id: String,
    pub amount: f64,
    pub status: WithdrawalStatus,
    /// Requester balance after an approval.
    pub balance: Option<f64>,
}

impl LedgerEngine {
    /// Record a cash-out request and prompt the admins. No balance changes.
    pub async fn request_withdrawal(
        &self,
        user_id: &str,
        amount: f64,
    ) -> Result<WithdrawalTicket, LedgerError> {
        validate_amount("amount", amount)?;

        let mut tx = self.db().begin_write().await?;
        ensure_not_banned(&mut tx, user_id).await?;
        let available = tx.balance(user_id).await?;
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let nickname = tx.user(user_id).await?.map(|u| u.nickname);
        let record = tx.insert_withdrawal(user_id, amount, Utc::now()).await?;
        tx.commit().await?;

        let token = WithdrawalToken(record.id);
        tracing::info!(target: "withdrawal", user = %user_id, amount, %token, "Withdrawal requested");
        self.notify(Notification::WithdrawalRequested {
            token,
            user_id: user_id.to_string(),
            nickname,
            amount,
        });
        Ok(WithdrawalTicket { token, amount })
    }

    /// Apply an admin decision to a request.
    pub async fn decide_withdrawal(
        &self,
        admin: &str,
        token: WithdrawalToken,
        decision: Decision,
    ) -> Result<WithdrawalOutcome, LedgerError> {
        self.require_admin(admin)?;
        let id = token.request_id();
        if self.decided.contains(&id) {
            return Err(LedgerError::AlreadyDecided(id));
        }

        let mut tx = self.db().begin_write().await?;
        let request = tx
            .withdrawal(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Withdrawal request {token}")))?;
        if WithdrawalStatus::from_str(&request.status)?.is_terminal() {
            drop(tx);
            self.decided.remember(id).await;
            return Err(LedgerError::AlreadyDecided(id));
        }

        let (status, balance) = match decision {
            Decision::Reject => (WithdrawalStatus::Rejected, None),
            Decision::Approve => match tx.debit(&request.user_id, request.amount).await {
                Ok(()) => (
                    WithdrawalStatus::Approved,
                    Some(tx.balance(&request.user_id).await?),
                ),
                Err(LedgerError::InsufficientFunds {
                    required,
                    available,
                }) => {
                    self.close(tx, &request, WithdrawalStatus::Abandoned, admin).await?;
                    tracing::warn!(
                        target: "withdrawal",
                        %token,
                        user = %request.user_id,
                        required,
                        available,
                        "Approval failed on insufficient balance; request abandoned"
                    );
                    return Err(LedgerError::InsufficientFunds {
                        required,
                        available,
                    });
                }
                Err(e) => return Err(e),
            },
        };
        self.close(tx, &request, status, admin).await?;

        tracing::info!(
            target: "withdrawal",
            %token,
            %admin,
            user = %request.user_id,
            amount = request.amount,
            status = status.as_str(),
            "Withdrawal decided"
        );
        let notification = match status {
            WithdrawalStatus::Approved => Notification::WithdrawalApproved {
                token,
                user_id: request.user_id.clone(),
                amount: request.amount,
            },
            _ => Notification::WithdrawalRejected {
                token,
                user_id: request.user_id.clone(),
                amount: request.amount,
            },
        };
        self.notify(notification);

        Ok(WithdrawalOutcome {
            token,
            user_id: request.user_id,
            amount: request.amount,
            status,
            balance,
        })
    }

    /// Claim the request with its final status and commit.
    async fn close(
        &self,
        mut tx: WriteTx,
        request: &WithdrawalRecord,
        status: WithdrawalStatus,
        admin: &str,
    ) -> Result<(), LedgerError> {
        if tx
            .claim_withdrawal(request.id, status, admin, Utc::now())
            .await?
            .is_none()
        {
            return Err(LedgerError::AlreadyDecided(request.id));
        }
        tx.commit().await?;
        self.decided.remember(request.id).await;
        Ok(())
    }

    pub async fn pending_withdrawals(
        &self,
        admin: &str,
    ) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        self.require_admin(admin)?;
        self.db().pending_withdrawals().await
    }

    pub async fn withdrawal_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        self.db().withdrawals_for(user_id).await
    }
}
