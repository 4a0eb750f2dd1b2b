// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use crate::domain::types::{Decision, WithdrawalToken};
use crate::services::ledger::engine::LedgerEngine;
use serde::{Deserialize, Serialize};

/// Request decoded by the transport from a front-end submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    Register {
        nick: String,
        #[serde(default)]
        role: String,
    },
    Purchase {
        bond_id: i64,
        amount: f64,
    },
    Redeem {
        bond_id: i64,
    },
    Transfer {
        target_id: String,
        amount: f64,
    },
    Withdraw {
        amount: f64,
    },
}

/// Result rendered for direct display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub ok: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn declined(err: &LedgerError) -> Self {
        let message = match err {
            LedgerError::StoreUnavailable(_) => {
                "Service temporarily unavailable, please try again".to_string()
            }
            other => other.to_string(),
        };
        Self { ok: false, message }
    }
}

fn render<T>(
    action: &str,
    user_id: &str,
    result: Result<T, LedgerError>,
    ok: impl FnOnce(T) -> String,
) -> Outcome {
    match result {
        Ok(value) => Outcome::success(ok(value)),
        Err(err) => {
            if err.is_retryable() {
                tracing::warn!(target: "ledger", %action, user = %user_id, error = %err, "Operation failed");
            } else {
                tracing::debug!(target: "ledger", %action, user = %user_id, reason = %err, "Operation declined");
            }
            Outcome::declined(&err)
        }
    }
}

impl LedgerEngine {
    pub async fn handle(&self, user_id: &str, action: UserAction) -> Outcome {
        match action {
            UserAction::Register { nick, role } => render(
                "register",
                user_id,
                self.register(user_id, &nick, &role).await,
                |user| format!("Registration complete. Welcome, {}!", user.nickname),
            ),
            UserAction::Purchase { bond_id, amount } => render(
                "purchase",
                user_id,
                self.purchase(user_id, bond_id, amount).await,
                |h| format!("Bought {} for {:.2} GOLD (bond #{})", h.name, h.principal, h.id),
            ),
            UserAction::Redeem { bond_id } => render(
                "redeem",
                user_id,
                self.redeem(user_id, bond_id).await,
                |r| {
                    format!(
                        "Redeemed {} for {:.2} GOLD. Balance: {:.2}",
                        r.name, r.payout, r.balance
                    )
                },
            ),
            UserAction::Transfer { target_id, amount } => render(
                "transfer",
                user_id,
                self.transfer(user_id, &target_id, amount).await,
                |t| format!("Sent {:.2} GOLD to {}", t.amount, t.to),
            ),
            UserAction::Withdraw { amount } => render(
                "withdraw",
                user_id,
                self.request_withdrawal(user_id, amount).await,
                |t| format!("Withdrawal request for {:.2} GOLD sent to administrators", t.amount),
            ),
        }
    }

    /// Admin decision button. `token` is the raw callback payload.
    pub async fn handle_decision(&self, admin: &str, token: &str, decision: Decision) -> Outcome {
        let result = match token.parse::<WithdrawalToken>() {
            Ok(token) => self.decide_withdrawal(admin, token, decision).await,
            Err(e) => Err(e),
        };
        render("decide", admin, result, |o| match o.balance {
            Some(_) => format!("Paid out {:.2} GOLD to {}", o.amount, o.user_id),
            None => format!("Rejected {:.2} GOLD for {}", o.amount, o.user_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_decode_from_front_end_json() {
        let action: UserAction =
            serde_json::from_str(r#"{"action":"transfer","target_id":"77","amount":12.5}"#).unwrap();
        assert_eq!(
            action,
            UserAction::Transfer {
                target_id: "77".into(),
                amount: 12.5
            }
        );
        let action: UserAction = serde_json::from_str(r#"{"action":"register","nick":"Astrid"}"#).unwrap();
        assert_eq!(
            action,
            UserAction::Register {
                nick: "Astrid".into(),
                role: String::new()
            }
        );
        assert!(serde_json::from_str::<UserAction>(r#"{"action":"mint","amount":1}"#).is_err());
    }

    #[test]
    fn store_failures_are_not_leaked_to_users() {
        let outcome = Outcome::declined(&LedgerError::StoreUnavailable("disk I/O error".into()));
        assert!(!outcome.ok);
        assert!(!outcome.message.contains("disk"));
        let outcome = Outcome::declined(&LedgerError::Locked(4));
        assert_eq!(outcome.message, "Bond 4 is locked for redemption");
    }
}
