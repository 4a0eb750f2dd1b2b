// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod accrual;
pub mod admin;
pub mod commands;
pub mod engine;
pub mod view;
pub mod withdrawal;

pub use admin::AdminPolicy;
pub use commands::{Outcome, UserAction};
pub use engine::{LedgerEngine, Redemption, TransferReceipt};
pub use withdrawal::{WithdrawalOutcome, WithdrawalTicket};
