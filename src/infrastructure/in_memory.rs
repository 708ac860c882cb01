use crate::domain::account::{Account, AccountPatch};
use crate::domain::ports::AccountStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory account table.
///
/// Uses `Arc<RwLock<HashMap<String, Account>>>` to allow shared concurrent
/// access. Ideal for tests and ad-hoc runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_or_create(&self, identity: &str, today: NaiveDate) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .entry(identity.to_string())
            .or_insert_with(|| Account::new(identity, today));
        account.roll_day(today);
        Ok(account.clone())
    }

    async fn update(&self, identity: &str, patch: AccountPatch) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(identity)
            .ok_or_else(|| LedgerError::AccountNotFound(identity.to_string()))?;
        account.apply(patch);
        Ok(account.clone())
    }

    async fn active_accounts(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut active: Vec<Account> = accounts
            .values()
            .filter(|account| account.checked_in_at.is_some())
            .cloned()
            .collect();
        active.sort_by_key(|account| account.checked_in_at);
        Ok(active)
    }

    async fn top_by_balance(&self, limit: usize) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut ranked: Vec<Account> = accounts.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Balance;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_creates_defaults() {
        let store = InMemoryAccountStore::new();
        let account = store.get_or_create("42", day(10)).await.unwrap();
        assert_eq!(account.identity, "42");
        assert_eq!(account.balance, Balance::ZERO);
        assert_eq!(account.today_date, day(10));
    }

    #[tokio::test]
    async fn test_get_or_create_rolls_day_forward() {
        let store = InMemoryAccountStore::new();
        store.get_or_create("42", day(9)).await.unwrap();
        store
            .update(
                "42",
                AccountPatch {
                    today_consumption: Some(Balance::new(dec!(7.5))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let account = store.get_or_create("42", day(10)).await.unwrap();
        assert_eq!(account.today_date, day(10));
        assert_eq!(account.today_consumption, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_update_unknown_identity() {
        let store = InMemoryAccountStore::new();
        let result = store.update("missing", AccountPatch::default()).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_active_accounts_ordered_by_check_in() {
        let store = InMemoryAccountStore::new();
        for (identity, hour) in [("late", 10), ("early", 8), ("middle", 9)] {
            store.get_or_create(identity, day(10)).await.unwrap();
            store
                .update(
                    identity,
                    AccountPatch {
                        checked_in_at: Some(Some(
                            Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
                        )),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        store.get_or_create("idle", day(10)).await.unwrap();

        let active = store.active_accounts().await.unwrap();
        let order: Vec<&str> = active.iter().map(|a| a.identity.as_str()).collect();
        assert_eq!(order, ["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_top_by_balance_orders_and_limits() {
        let store = InMemoryAccountStore::new();
        for (identity, balance) in [("a", 5), ("b", 10), ("c", 10), ("d", 1)] {
            store.get_or_create(identity, day(10)).await.unwrap();
            store
                .update(
                    identity,
                    AccountPatch {
                        balance: Some(Balance::new(Decimal::from(balance))),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let top = store.top_by_balance(3).await.unwrap();
        let order: Vec<&str> = top.iter().map(|a| a.identity.as_str()).collect();
        // Ties broken by ascending identity.
        assert_eq!(order, ["b", "c", "a"]);
    }
}
