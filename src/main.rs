// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::{Parser, Subcommand};
use gold_ledger::app::config::GlobalSettings;
use gold_ledger::app::logging::setup_logging;
use gold_ledger::common::parsing::{parse_amount, parse_boolish};
use gold_ledger::common::retry::retry_async;
use gold_ledger::domain::error::{AppError, LedgerError};
use gold_ledger::domain::types::{Decision, WithdrawalToken};
use gold_ledger::infrastructure::data::db::Database;
use gold_ledger::infrastructure::notify::{LogSink, Notifier, spawn_dispatcher};
use gold_ledger::services::ledger::LedgerEngine;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const READ_ATTEMPTS: usize = 3;
const READ_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about = "gold ledger operator console")]
struct Cli {
    /// Path to config file (default: active config.*.toml, then config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Log filter (overrides debug flag from config)
    #[arg(long)]
    log_level: Option<String>,

    /// Identity to act as (must be an admin)
    #[arg(long)]
    operator: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations and exit
    Migrate,
    /// Composite view of one user
    View { user: String },
    /// List bond products
    Catalog,
    /// List a new bond product
    AddProduct {
        name: String,
        price: f64,
        rate: f64,
        #[arg(long, default_value_t = 0)]
        min_days: i64,
    },
    /// Delist a bond product; existing holdings are unaffected
    RemoveProduct { id: i64 },
    /// Credit a user balance
    Deposit {
        user: String,
        #[arg(value_parser = amount_arg)]
        amount: f64,
    },
    /// Signed balance correction
    Adjust {
        user: String,
        #[arg(allow_hyphen_values = true, value_parser = delta_arg)]
        delta: f64,
    },
    /// Set the redemption lock of a holding
    Lock {
        holding: i64,
        /// Allow redemption (true/false, yes/no, 1/0)
        #[arg(long, action = clap::ArgAction::Set, value_parser = boolish_arg)]
        unlocked: bool,
    },
    /// All holdings with owners
    Holdings,
    /// All balances with nicknames
    Balances,
    /// Open withdrawal requests
    Pending,
    /// Approve a withdrawal request (token `wd:<id>`)
    Approve { token: WithdrawalToken },
    /// Reject a withdrawal request (token `wd:<id>`)
    Reject { token: WithdrawalToken },
    /// Replace the notice board line
    SetInfo { text: String },
    /// Ban (or with --lift, unban) a user
    Ban {
        user: String,
        #[arg(long, default_value_t = false)]
        lift: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Migrate => "migrate",
            Command::View { .. } => "view",
            Command::Catalog => "catalog",
            Command::AddProduct { .. } => "add-product",
            Command::RemoveProduct { .. } => "remove-product",
            Command::Deposit { .. } => "deposit",
            Command::Adjust { .. } => "adjust",
            Command::Lock { .. } => "lock",
            Command::Holdings => "holdings",
            Command::Balances => "balances",
            Command::Pending => "pending",
            Command::Approve { .. } => "approve",
            Command::Reject { .. } => "reject",
            Command::SetInfo { .. } => "set-info",
            Command::Ban { .. } => "ban",
        }
    }
}

fn amount_arg(raw: &str) -> Result<f64, String> {
    parse_amount(raw).ok_or_else(|| format!("invalid amount '{raw}'"))
}

fn delta_arg(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('-') {
        Some(rest) => amount_arg(rest).map(|v| -v),
        None => amount_arg(trimmed),
    }
}

fn boolish_arg(raw: &str) -> Result<bool, String> {
    parse_boolish(raw).ok_or_else(|| format!("expected true/false, got '{raw}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("render output: {e}")))?;
    println!("{body}");
    Ok(())
}

/// Reads are idempotent, so transient store failures are retried.
async fn read_with_retry<F, Fut, T>(op: F) -> Result<T, LedgerError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    retry_async(
        |_| op(),
        READ_ATTEMPTS,
        READ_BACKOFF,
        LedgerError::is_retryable,
    )
    .await
}

async fn run(engine: &LedgerEngine, operator: &str, command: Command) -> Result<(), AppError> {
    match command {
        Command::Migrate => {
            tracing::info!(target: "db", "Migrations applied");
        }
        Command::View { user } => {
            print_json(&read_with_retry(|| engine.user_view(&user)).await?)?;
        }
        Command::Catalog => {
            print_json(&read_with_retry(|| engine.catalog()).await?)?;
        }
        Command::AddProduct {
            name,
            price,
            rate,
            min_days,
        } => {
            let product = engine
                .create_product(operator, &name, price, rate, min_days)
                .await?;
            print_json(&product)?;
        }
        Command::RemoveProduct { id } => {
            engine.remove_product(operator, id).await?;
            println!("Product {id} delisted");
        }
        Command::Deposit { user, amount } => {
            let balance = engine.deposit(operator, &user, amount).await?;
            println!("{user}: {balance:.2} GOLD");
        }
        Command::Adjust { user, delta } => {
            let balance = engine.adjust_balance(operator, &user, delta).await?;
            println!("{user}: {balance:.2} GOLD");
        }
        Command::Lock { holding, unlocked } => {
            engine.set_lock(operator, holding, unlocked).await?;
            println!(
                "Bond {holding} {}",
                if unlocked { "unlocked" } else { "locked" }
            );
        }
        Command::Holdings => {
            print_json(&read_with_retry(|| engine.all_holdings(operator)).await?)?;
        }
        Command::Balances => {
            print_json(&read_with_retry(|| engine.all_balances(operator)).await?)?;
        }
        Command::Pending => {
            print_json(&read_with_retry(|| engine.pending_withdrawals(operator)).await?)?;
        }
        Command::Approve { token } => {
            let outcome = engine
                .decide_withdrawal(operator, token, Decision::Approve)
                .await?;
            print_json(&outcome)?;
        }
        Command::Reject { token } => {
            let outcome = engine
                .decide_withdrawal(operator, token, Decision::Reject)
                .await?;
            print_json(&outcome)?;
        }
        Command::SetInfo { text } => {
            engine.set_info(operator, &text).await?;
            println!("Notice updated");
        }
        Command::Ban { user, lift } => {
            engine.set_banned(operator, &user, !lift).await?;
            println!("{user} {}", if lift { "unbanned" } else { "banned" });
        }
    }
    Ok(())
}


#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if let Some(operator) = cli.operator {
        settings.operator_id = Some(operator);
    }
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| if settings.debug { "debug" } else { "info" }.to_string());
    setup_logging(&log_level, cli.log_json || settings.log_json);

    let operator = settings.operator_identity()?;
    let admins = settings.admin_policy();
    if !admins.is_admin(&operator) {
        return Err(AppError::Config(format!(
            "operator {operator} is not listed in admin_ids"
        )));
    }

    let database_url = settings.database_url();
    let db = Database::with_max_connections(&database_url, settings.max_connections).await?;

    let shutdown = CancellationToken::new();
    let (notifier, rx) = Notifier::channel();
    let dispatcher = spawn_dispatcher(
        rx,
        Arc::new(LogSink),
        settings.delivery_policy(),
        shutdown.clone(),
    );
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; stopping notification dispatcher");
                shutdown.cancel();
            }
        });
    }

    let engine = LedgerEngine::new(db, admins, notifier);
    let command = cli.command;
    let name = command.name();
    tracing::debug!(command = name, %operator, "Running operator command");
    let result = run(&engine, &operator, command).await;

    // Closing the last sender lets the dispatcher drain and exit.
    drop(engine);
    if let Err(e) = dispatcher.await {
        tracing::warn!(target: "notify", error = %e, "Notification dispatcher join failed");
    }

    if let Err(e) = &result {
        tracing::error!(command = name, error = %e, "Command failed");
    }
    result
}
