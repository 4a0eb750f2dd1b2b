// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use thiserror::Error;

/// Declined or failed ledger operation. Every variant except
/// `StoreUnavailable` is a validation outcome that left state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds. Required: {required:.2}, Available: {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Amount {amount:.2} is below the product minimum of {minimum:.2}")]
    BelowMinimum { amount: f64, minimum: f64 },

    #[error("Bond product {0} does not exist")]
    UnknownProduct(i64),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bond {0} is locked for redemption")]
    Locked(i64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Account {0} is banned")]
    Banned(String),

    #[error("Withdrawal request {0} was already decided")]
    AlreadyDecided(i64),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Only persistence failures are worth retrying; everything else is a
    /// definitive decline.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
