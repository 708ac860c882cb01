use super::account::{Account, AccountPatch};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type ClockBox = Box<dyn Clock>;

/// The durable account table. Implementations must persist every change
/// before returning; no call may return a value other than the one committed
/// in the same call.
///
/// Callers are expected to hold the engine's serialization gate across each
/// read-modify-write span; the store itself only guards its own interior.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns the record for `identity`, creating a default one on first
    /// reference. Performs the daily rollover check against `today` and
    /// persists any rollover before returning.
    async fn get_or_create(&self, identity: &str, today: NaiveDate) -> Result<Account>;

    /// Loads the record, applies the patch on top, persists the full row and
    /// returns it. Fails with `AccountNotFound` for an unknown identity.
    async fn update(&self, identity: &str, patch: AccountPatch) -> Result<Account>;

    /// All accounts with an open session, ordered by ascending check-in
    /// instant.
    async fn active_accounts(&self) -> Result<Vec<Account>>;

    /// Top accounts by descending balance, ties broken by ascending identity.
    async fn top_by_balance(&self, limit: usize) -> Result<Vec<Account>>;
}

/// Source of the current instant and the local calendar day.
///
/// The daily consumption window follows the host's local date, matching the
/// stored behavior of the accounts table.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time, local calendar day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. Clones share the same instant, so a
/// test can keep a handle while the engine owns another.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + chrono::Duration::seconds(secs);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}
