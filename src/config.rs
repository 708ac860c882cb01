use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

/// Runtime configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fee charged per hour of attendance.
    pub hourly_rate: Decimal,
    /// Sessions no longer than this many seconds are free.
    pub grace_period_secs: i64,
    /// Identities allowed to run credit/debit/set-discount.
    pub admins: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hourly_rate: dec!(6.0),
            grace_period_secs: 120,
            admins: HashSet::new(),
        }
    }
}

impl Config {
    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(identity)
    }

    /// Fee for one 30-minute billing unit.
    pub fn fee_per_unit(&self) -> Decimal {
        self.hourly_rate / dec!(2)
    }
}
