use crate::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Represents a monetary value on an account.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for fee and balance calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// Implement basic arithmetic for Balance to make it a usable Value Object
impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// Represents a positive monetary amount for credit and debit operations.
///
/// Ensures that admin-supplied amounts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "amount must be greater than zero".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s).map_err(|_| {
            LedgerError::Validation("amount must be a number greater than zero".to_string())
        })?;
        Self::new(value)
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

/// A multiplicative fee factor in (0, 1]. A rate of 1 means no discount.
///
/// Parses from either a percentage ("50%") or a plain decimal ("0.5").
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    pub fn new(rate: Decimal) -> Result<Self, LedgerError> {
        if rate > Decimal::ZERO && rate <= Decimal::ONE {
            Ok(Self(rate))
        } else {
            Err(LedgerError::Validation(
                "discount rate must be within (0, 1], e.g. 50% or 0.5".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for DiscountRate {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |text: &str| {
            Decimal::from_str(text).map_err(|_| {
                LedgerError::Validation(
                    "discount rate must be a number like 50% or 0.5".to_string(),
                )
            })
        };

        let rate = match s.strip_suffix('%') {
            Some(percentage) => parse(percentage)? / Decimal::ONE_HUNDRED,
            None => parse(s)?,
        };
        Self::new(rate)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AccountStatus {
    Active,
    Idle,
}

/// The state of one account, keyed by its identity string.
///
/// `checked_in_at` doubles as the session state: `None` means idle, `Some`
/// means an open session started at that instant.
#[derive(Debug, PartialEq, Clone)]
pub struct Account {
    /// The unique identity string naming the account holder.
    pub identity: String,
    /// Current funds. Debits that would drive this negative are rejected whole.
    pub balance: Balance,
    /// Start instant of the open session, if any.
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Cumulative seconds across all completed sessions.
    pub total_time: i64,
    /// Calendar day `today_consumption` is valid for.
    pub today_date: NaiveDate,
    /// Amount charged on `today_date`.
    pub today_consumption: Balance,
    /// Fee factor in (0, 1]; 1 means no discount.
    pub discount: Decimal,
}

impl Account {
    pub fn new(identity: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            identity: identity.into(),
            balance: Balance::ZERO,
            checked_in_at: None,
            total_time: 0,
            today_date: today,
            today_consumption: Balance::ZERO,
            discount: Decimal::ONE,
        }
    }

    pub fn status(&self) -> AccountStatus {
        if self.checked_in_at.is_some() {
            AccountStatus::Active
        } else {
            AccountStatus::Idle
        }
    }

    /// Rolls the daily consumption window forward when the account is loaded
    /// on a new calendar day. Returns whether anything changed, so stores can
    /// persist the rollover in the same load.
    pub fn roll_day(&mut self, today: NaiveDate) -> bool {
        if self.today_date != today {
            self.today_date = today;
            self.today_consumption = Balance::ZERO;
            true
        } else {
            false
        }
    }

    /// Applies a partial update on top of the current state.
    pub fn apply(&mut self, patch: AccountPatch) {
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(checked_in_at) = patch.checked_in_at {
            self.checked_in_at = checked_in_at;
        }
        if let Some(total_time) = patch.total_time {
            self.total_time = total_time;
        }
        if let Some(today_consumption) = patch.today_consumption {
            self.today_consumption = today_consumption;
        }
        if let Some(discount) = patch.discount {
            self.discount = discount;
        }
    }
}

/// A partial account update: each field is independently settable or left
/// untouched. `checked_in_at` is doubly optional so a patch can distinguish
/// "leave as is" (`None`) from "clear the session" (`Some(None)`).
///
/// `today_date` is deliberately absent: the daily window only ever advances
/// through the rollover in `get_or_create`.
#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub balance: Option<Balance>,
    pub checked_in_at: Option<Option<DateTime<Utc>>>,
    pub total_time: Option<i64>,
    pub today_consumption: Option<Balance>,
    pub discount: Option<Decimal>,
}
