// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod accounts;
pub mod catalog;
pub mod db;
pub mod holdings;
pub mod notices;
pub mod schema;
pub mod users;
pub mod withdrawals;
