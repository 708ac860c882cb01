//! Pure fee computation. No I/O, no clock: callers supply the elapsed
//! duration and the tariff.

use crate::domain::account::Balance;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Length of one billing unit in seconds. Partial units are billed whole.
pub const BILLING_UNIT_SECS: i64 = 1800;

/// Computes the fee for a completed session.
///
/// Sessions no longer than `grace_period_secs` are fully waived. Beyond the
/// grace period the duration is rounded up to whole 30-minute units, each
/// billed at half the hourly rate, then scaled by the account's discount.
pub fn elapsed_fee(
    duration_secs: i64,
    grace_period_secs: i64,
    hourly_rate: Decimal,
    discount: Decimal,
) -> Balance {
    if duration_secs <= grace_period_secs {
        return Balance::ZERO;
    }

    let units = (duration_secs + BILLING_UNIT_SECS - 1) / BILLING_UNIT_SECS;
    let fee = Decimal::from(units) * (hourly_rate / dec!(2)) * discount;
    Balance::new(fee)
}

/// Whether `balance` covers `fee`. A failed check must leave the caller's
/// state completely untouched.
pub fn can_afford(balance: Balance, fee: Balance) -> bool {
    balance >= fee
}
