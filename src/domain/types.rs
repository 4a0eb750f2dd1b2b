// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{
    STATUS_ABANDONED, STATUS_APPROVED, STATUS_REJECTED, STATUS_REQUESTED,
    WITHDRAWAL_TOKEN_PREFIX,
};
use crate::domain::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Correlation data handed to the admin decision surface. Only the
/// server-issued request id travels; requester and amount are always read
/// back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WithdrawalToken(pub i64);

impl WithdrawalToken {
    pub fn request_id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for WithdrawalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{WITHDRAWAL_TOKEN_PREFIX}{}", self.0)
    }
}

impl FromStr for WithdrawalToken {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix(WITHDRAWAL_TOKEN_PREFIX)
            .unwrap_or(trimmed);
        let id: i64 = digits
            .parse()
            .map_err(|_| LedgerError::validation("token", format!("malformed token '{raw}'")))?;
        if id <= 0 {
            return Err(LedgerError::validation(
                "token",
                format!("malformed token '{raw}'"),
            ));
        }
        Ok(WithdrawalToken(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Requested,
    Approved,
    Rejected,
    /// Approval was attempted against an insufficient balance.
    Abandoned,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Requested => STATUS_REQUESTED,
            WithdrawalStatus::Approved => STATUS_APPROVED,
            WithdrawalStatus::Rejected => STATUS_REJECTED,
            WithdrawalStatus::Abandoned => STATUS_ABANDONED,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Requested)
    }
}

impl FromStr for WithdrawalStatus {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            STATUS_REQUESTED => Ok(WithdrawalStatus::Requested),
            STATUS_APPROVED => Ok(WithdrawalStatus::Approved),
            STATUS_REJECTED => Ok(WithdrawalStatus::Rejected),
            STATUS_ABANDONED => Ok(WithdrawalStatus::Abandoned),
            other => Err(LedgerError::validation(
                "status",
                format!("unknown withdrawal status '{other}'"),
            )),
        }
    }
}
