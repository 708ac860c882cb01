use crate::config::Config;
use crate::domain::account::{Account, AccountPatch, Amount, Balance, DiscountRate};
use crate::domain::billing;
use crate::domain::command::Command;
use crate::domain::ports::{AccountStoreBox, ClockBox};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// The main entry point for executing ledger commands.
///
/// `LedgerEngine` owns the account store and serializes every operation,
/// mutating or read-only, behind a single gate, so the affordability check
/// and the debit of a check-out can never interleave with another caller's
/// writes. Hold times are bounded by one record read plus one write.
pub struct LedgerEngine {
    store: AccountStoreBox,
    clock: ClockBox,
    config: Config,
    gate: Mutex<()>,
}

/// The structured result of a successful command, rendered to text by the
/// transport-facing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    CheckedIn {
        balance: Balance,
    },
    CheckedOutWaived {
        duration_secs: i64,
    },
    CheckedOut {
        duration_secs: i64,
        fee: Balance,
        today_consumption: Balance,
        balance: Balance,
    },
    Info(Account),
    Balance {
        identity: String,
        balance: Balance,
    },
    ActiveList(Vec<ActiveSession>),
    Rank(Vec<RankEntry>),
    Credited {
        target: String,
        amount: Balance,
        balance: Balance,
    },
    Debited {
        target: String,
        amount: Balance,
        balance: Balance,
    },
    DiscountSet {
        target: String,
        rate: Decimal,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub identity: String,
    pub elapsed_secs: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub identity: String,
    pub balance: Balance,
}

/// How many entries the balance ranking returns.
pub const RANK_LIMIT: usize = 10;

impl LedgerEngine {
    pub fn new(store: AccountStoreBox, clock: ClockBox, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
            gate: Mutex::new(()),
        }
    }

    /// Executes one command on behalf of `identity`.
    ///
    /// Commands that act on the caller's own account refuse to run when the
    /// transport failed to resolve an identity; aggregate queries and help do
    /// not need one.
    pub async fn execute(&self, identity: &str, command: Command) -> Result<Outcome> {
        match command {
            Command::CheckIn => self.check_in(require_identity(identity)?).await,
            Command::CheckOut => self.check_out(require_identity(identity)?).await,
            Command::Info => self.info(require_identity(identity)?).await,
            Command::Balance => self.balance(require_identity(identity)?).await,
            Command::ActiveList => self.active_list().await,
            Command::Rank => self.rank(RANK_LIMIT).await,
            Command::Credit { target, amount } => {
                self.credit(require_identity(identity)?, &target, amount).await
            }
            Command::Debit { target, amount } => {
                self.debit(require_identity(identity)?, &target, amount).await
            }
            Command::SetDiscount { target, rate } => {
                self.set_discount(require_identity(identity)?, &target, rate)
                    .await
            }
            Command::Help => Ok(Outcome::Help),
        }
    }

    pub async fn check_in(&self, identity: &str) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let account = self
            .store
            .get_or_create(identity, self.clock.today())
            .await?;
        if account.checked_in_at.is_some() {
            return Err(LedgerError::AlreadyCheckedIn);
        }

        self.store
            .update(
                identity,
                AccountPatch {
                    checked_in_at: Some(Some(self.clock.now())),
                    ..Default::default()
                },
            )
            .await?;
        Ok(Outcome::CheckedIn {
            balance: account.balance,
        })
    }

    pub async fn check_out(&self, identity: &str) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let now = self.clock.now();
        let account = self
            .store
            .get_or_create(identity, self.clock.today())
            .await?;
        let Some(checked_in_at) = account.checked_in_at else {
            return Err(LedgerError::NotCheckedIn);
        };

        let duration_secs = (now - checked_in_at).num_seconds().max(0);
        if duration_secs <= self.config.grace_period_secs {
            self.store
                .update(
                    identity,
                    AccountPatch {
                        checked_in_at: Some(None),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(Outcome::CheckedOutWaived { duration_secs });
        }

        let fee = billing::elapsed_fee(
            duration_secs,
            self.config.grace_period_secs,
            self.config.hourly_rate,
            account.discount,
        );
        if !billing::can_afford(account.balance, fee) {
            // The session stays open and nothing is written.
            return Err(LedgerError::InsufficientBalance {
                required: fee,
                available: account.balance,
            });
        }

        let updated = self
            .store
            .update(
                identity,
                AccountPatch {
                    balance: Some(account.balance - fee),
                    today_consumption: Some(account.today_consumption + fee),
                    total_time: Some(account.total_time + duration_secs),
                    checked_in_at: Some(None),
                    discount: None,
                },
            )
            .await?;
        tracing::info!("settled session for {identity}: {duration_secs}s, fee {fee}");
        Ok(Outcome::CheckedOut {
            duration_secs,
            fee,
            today_consumption: updated.today_consumption,
            balance: updated.balance,
        })
    }

    pub async fn info(&self, identity: &str) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let account = self
            .store
            .get_or_create(identity, self.clock.today())
            .await?;
        Ok(Outcome::Info(account))
    }

    pub async fn balance(&self, identity: &str) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let account = self
            .store
            .get_or_create(identity, self.clock.today())
            .await?;
        Ok(Outcome::Balance {
            identity: account.identity,
            balance: account.balance,
        })
    }

    pub async fn active_list(&self) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let now = self.clock.now();
        let sessions = self
            .store
            .active_accounts()
            .await?
            .into_iter()
            .map(|account| {
                let elapsed_secs = account
                    .checked_in_at
                    .map(|instant| (now - instant).num_seconds().max(0))
                    .unwrap_or(0);
                ActiveSession {
                    identity: account.identity,
                    elapsed_secs,
                }
            })
            .collect();
        Ok(Outcome::ActiveList(sessions))
    }

    pub async fn rank(&self, limit: usize) -> Result<Outcome> {
        let _gate = self.gate.lock().await;
        let entries = self
            .store
            .top_by_balance(limit)
            .await?
            .into_iter()
            .map(|account| RankEntry {
                identity: account.identity,
                balance: account.balance,
            })
            .collect();
        Ok(Outcome::Rank(entries))
    }

    pub async fn credit(&self, caller: &str, target: &str, amount: Amount) -> Result<Outcome> {
        self.require_admin(caller)?;
        let _gate = self.gate.lock().await;
        let account = self.store.get_or_create(target, self.clock.today()).await?;
        let updated = self
            .store
            .update(
                target,
                AccountPatch {
                    balance: Some(account.balance + Balance::from(amount)),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!("{caller} credited {target} with {}", amount.value());
        Ok(Outcome::Credited {
            target: updated.identity,
            amount: Balance::from(amount),
            balance: updated.balance,
        })
    }

    pub async fn debit(&self, caller: &str, target: &str, amount: Amount) -> Result<Outcome> {
        self.require_admin(caller)?;
        let _gate = self.gate.lock().await;
        let account = self.store.get_or_create(target, self.clock.today()).await?;
        let amount: Balance = amount.into();
        if !billing::can_afford(account.balance, amount) {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: account.balance,
            });
        }

        let updated = self
            .store
            .update(
                target,
                AccountPatch {
                    balance: Some(account.balance - amount),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!("{caller} debited {amount} from {target}");
        Ok(Outcome::Debited {
            target: updated.identity,
            amount,
            balance: updated.balance,
        })
    }

    pub async fn set_discount(
        &self,
        caller: &str,
        target: &str,
        rate: DiscountRate,
    ) -> Result<Outcome> {
        self.require_admin(caller)?;
        let _gate = self.gate.lock().await;
        self.store.get_or_create(target, self.clock.today()).await?;
        let updated = self
            .store
            .update(
                target,
                AccountPatch {
                    discount: Some(rate.value()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!("{caller} set discount for {target} to {}", rate.value());
        Ok(Outcome::DiscountSet {
            target: updated.identity,
            rate: updated.discount,
        })
    }

    fn require_admin(&self, caller: &str) -> Result<()> {
        if self.config.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::PermissionDenied)
        }
    }
}

fn require_identity(identity: &str) -> Result<&str> {
    if identity.trim().is_empty() {
        Err(LedgerError::EmptyIdentity)
    } else {
        Ok(identity)
    }
}
