//! Plain-text rendering of outcomes and errors.
//!
//! The core hands back structured values; this module is the only place that
//! turns them into user-facing lines for the transport to deliver.

use crate::application::engine::Outcome;
use crate::config::Config;
use crate::domain::account::{Account, AccountStatus};
use crate::error::LedgerError;
use rust_decimal::Decimal;
use std::fmt::Write;

/// Renders a successful outcome to the message the caller sees.
pub fn render_outcome(outcome: &Outcome, config: &Config) -> String {
    match outcome {
        Outcome::CheckedIn { balance } => {
            format!("Checked in, balance {balance}")
        }
        Outcome::CheckedOutWaived { duration_secs } => format!(
            "Checked out after {}, within the {} grace period, no charge",
            format_duration(*duration_secs),
            format_duration(config.grace_period_secs)
        ),
        Outcome::CheckedOut {
            duration_secs,
            fee,
            today_consumption,
            balance,
        } => format!(
            "Checked out after {}, charged {fee}, today {today_consumption}, balance {balance}",
            format_duration(*duration_secs)
        ),
        Outcome::Info(account) => render_info(account),
        Outcome::Balance { identity, balance } => {
            format!("Balance for {identity}: {balance}")
        }
        Outcome::ActiveList(sessions) => {
            if sessions.is_empty() {
                return "No one is currently checked in".to_string();
            }
            let mut text = String::from("Currently checked in:");
            for session in sessions {
                let _ = write!(
                    text,
                    "\n- {}: {}",
                    session.identity,
                    format_duration(session.elapsed_secs)
                );
            }
            text
        }
        Outcome::Rank(entries) => {
            if entries.is_empty() {
                return "No accounts to rank".to_string();
            }
            let mut text = String::from("Balance ranking:");
            for (position, entry) in entries.iter().enumerate() {
                let _ = write!(
                    text,
                    "\n{}. {}: {}",
                    position + 1,
                    entry.identity,
                    entry.balance
                );
            }
            text
        }
        Outcome::Credited {
            target,
            amount,
            balance,
        } => format!("Credited {target} with {amount}, new balance {balance}"),
        Outcome::Debited {
            target,
            amount,
            balance,
        } => format!("Debited {amount} from {target}, new balance {balance}"),
        Outcome::DiscountSet { target, rate } => {
            format!("Discount for {target} set to {}", format_rate(*rate))
        }
        Outcome::Help => help_text(config),
    }
}

/// Renders a failed command. Storage and internal failures collapse into one
/// uniform service-unavailable line; everything else explains itself.
pub fn render_error(error: &LedgerError) -> String {
    match error {
        LedgerError::AlreadyCheckedIn => "Already checked in".to_string(),
        LedgerError::NotCheckedIn => "Not checked in, check in first".to_string(),
        LedgerError::InsufficientBalance {
            required,
            available,
        } => format!(
            "Insufficient balance: this requires {required}, current balance {available}"
        ),
        LedgerError::PermissionDenied => "Permission denied".to_string(),
        LedgerError::EmptyIdentity => {
            "Could not determine your identity, operation aborted".to_string()
        }
        LedgerError::UnknownCommand(name) => {
            format!("Unknown command: {name} (send help for usage)")
        }
        LedgerError::Validation(message) => message.clone(),
        LedgerError::AccountNotFound(_)
        | LedgerError::Csv(_)
        | LedgerError::Io(_)
        | LedgerError::Storage(_) => "Service unavailable, please try again later".to_string(),
    }
}

fn render_info(account: &Account) -> String {
    let status = match account.status() {
        AccountStatus::Active => "checked in",
        AccountStatus::Idle => "checked out",
    };
    let discount = if account.discount < Decimal::ONE {
        format!(" ({} discount active)", format_rate(account.discount))
    } else {
        String::new()
    };
    format!(
        "Identity: {}\nStatus: {}\nBalance: {}{}\nToday: {}\nTotal time: {}",
        account.identity,
        status,
        account.balance,
        discount,
        account.today_consumption,
        format_duration(account.total_time)
    )
}

pub fn help_text(config: &Config) -> String {
    format!(
        "Commands:\n\
         - check-in          start a session\n\
         - check-out         end the session and settle the fee\n\
         - info              show your account\n\
         - balance           show your balance\n\
         - active-list       everyone currently checked in\n\
         - rank              top balances\n\
         Admin commands:\n\
         - credit <identity> <amount>\n\
         - debit <identity> <amount>\n\
         - set-discount <identity> <rate>   (e.g. 50% or 0.5)\n\
         Fee: {:.2} per 30 minutes, partial units billed whole; \
         sessions up to {} are free",
        config.fee_per_unit(),
        format_duration(config.grace_period_secs)
    )
}

fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// Compact `XhYmZs` rendering; hour and minute parts are elided when zero,
/// the second part always shows.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut text = String::new();
    if hours > 0 {
        let _ = write!(text, "{hours}h");
    }
    if minutes > 0 {
        let _ = write!(text, "{minutes}m");
    }
    let _ = write!(text, "{seconds}s");
    text
}
