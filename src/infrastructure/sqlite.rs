use crate::domain::account::{Account, AccountPatch, Balance};
use crate::domain::ports::AccountStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str =
    "identity, balance, checked_in_at, total_time, today_date, today_consumption, discount";

/// The durable account table, backed by SQLite.
///
/// Monetary columns are stored as decimal text so that balances survive
/// round-trips exactly. `checked_in_at` is stored as unix seconds; a NULL
/// means no open session.
///
/// This struct is thread-safe (`Clone` shares the underlying connection).
#[derive(Clone)]
pub struct SqliteAccountStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAccountStore {
    /// Opens or creates the database at `path` and brings its schema up to
    /// date. Failure here must disable the service entirely; callers treat it
    /// as fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        run_pending_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// An isolated throwaway database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_pending_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-query; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(conn: &Connection, account: &Account) -> Result<()> {
        conn.execute(
            "UPDATE accounts SET
               balance = ?1, checked_in_at = ?2, total_time = ?3,
               today_date = ?4, today_consumption = ?5, discount = ?6
             WHERE identity = ?7",
            params![
                account.balance.0.to_string(),
                account.checked_in_at.map(|instant| instant.timestamp()),
                account.total_time,
                account.today_date.format("%Y-%m-%d").to_string(),
                account.today_consumption.0.to_string(),
                account.discount.to_string(),
                account.identity,
            ],
        )?;
        Ok(())
    }

    fn select(conn: &Connection, identity: &str) -> Result<Option<Account>> {
        let account = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM accounts WHERE identity = ?1"),
                params![identity],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }
}

fn decimal_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(index)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let checked_in_at = match row.get::<_, Option<i64>>(2)? {
        Some(secs) => Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            rusqlite::Error::IntegralValueOutOfRange(2, secs)
        })?),
        None => None,
    };
    let today_date: String = row.get(4)?;
    let today_date = NaiveDate::parse_from_str(&today_date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Account {
        identity: row.get(0)?,
        balance: Balance::new(decimal_column(row, 1)?),
        checked_in_at,
        total_time: row.get(3)?,
        today_date,
        today_consumption: Balance::new(decimal_column(row, 5)?),
        discount: decimal_column(row, 6)?,
    })
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn get_or_create(&self, identity: &str, today: NaiveDate) -> Result<Account> {
        let conn = self.lock();
        let mut account = match Self::select(&conn, identity)? {
            Some(account) => account,
            None => {
                let account = Account::new(identity, today);
                conn.execute(
                    "INSERT INTO accounts
                       (identity, balance, checked_in_at, total_time,
                        today_date, today_consumption, discount)
                     VALUES (?1, ?2, NULL, 0, ?3, ?4, ?5)",
                    params![
                        account.identity,
                        account.balance.0.to_string(),
                        account.today_date.format("%Y-%m-%d").to_string(),
                        account.today_consumption.0.to_string(),
                        account.discount.to_string(),
                    ],
                )?;
                account
            }
        };

        if account.roll_day(today) {
            conn.execute(
                "UPDATE accounts SET today_date = ?1, today_consumption = ?2 WHERE identity = ?3",
                params![
                    account.today_date.format("%Y-%m-%d").to_string(),
                    account.today_consumption.0.to_string(),
                    account.identity,
                ],
            )?;
        }
        Ok(account)
    }

    async fn update(&self, identity: &str, patch: AccountPatch) -> Result<Account> {
        let conn = self.lock();
        let mut account = Self::select(&conn, identity)?
            .ok_or_else(|| LedgerError::AccountNotFound(identity.to_string()))?;
        account.apply(patch);
        Self::persist(&conn, &account)?;
        Ok(account)
    }

    async fn active_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts
             WHERE checked_in_at IS NOT NULL
             ORDER BY checked_in_at ASC"
        ))?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<rusqlite::Result<Vec<Account>>>()?;
        Ok(accounts)
    }

    async fn top_by_balance(&self, limit: usize) -> Result<Vec<Account>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM accounts"))?;
        let mut ranked = stmt
            .query_map([], account_from_row)?
            .collect::<rusqlite::Result<Vec<Account>>>()?;
        drop(stmt);

        // Balances are exact decimal text, so ordering happens in memory
        // rather than through SQL's numeric affinity.
        ranked.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}

/// Check if the `accounts` table exists.
fn accounts_table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='accounts'")?;
    let exists: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

/// Check if the `accounts` table has a `discount` column.
fn accounts_has_discount_column(conn: &Connection) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare("PRAGMA table_info('accounts')")?;
    let columns = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for column in columns {
        if column? == "discount" {
            return Ok(true);
        }
    }
    Ok(false)
}

fn create_accounts_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            identity          TEXT PRIMARY KEY,
            balance           TEXT NOT NULL DEFAULT '0',
            checked_in_at     INTEGER,
            total_time        INTEGER NOT NULL DEFAULT 0,
            today_date        TEXT NOT NULL,
            today_consumption TEXT NOT NULL DEFAULT '0',
            discount          TEXT NOT NULL DEFAULT '1'
        );

        CREATE INDEX IF NOT EXISTS idx_accounts_checked_in_at
            ON accounts(checked_in_at);
        "#,
    )?;
    Ok(())
}

/// Add the `discount` column to a table created before discounts existed.
/// Existing rows pick up the default rate of 1 (no discount).
fn migrate_add_discount_column(conn: &Connection) -> rusqlite::Result<()> {
    if accounts_has_discount_column(conn)? {
        return Ok(());
    }

    tracing::info!("adding 'discount' column to accounts table");
    conn.execute(
        "ALTER TABLE accounts ADD COLUMN discount TEXT NOT NULL DEFAULT '1'",
        [],
    )?;
    Ok(())
}

/// Public entry point: bring the schema up to date.
///
/// Each step checks the current schema state before acting, so the whole
/// sequence is idempotent and safe to run on every startup.
pub fn run_pending_migrations(conn: &Connection) -> rusqlite::Result<()> {
    if accounts_table_exists(conn)? {
        migrate_add_discount_column(conn)?;
    } else {
        create_accounts_table(conn)?;
    }
    Ok(())
}
