use chrono::{TimeZone, Utc};
use lounge_ledger::application::engine::{LedgerEngine, Outcome};
use lounge_ledger::config::Config;
use lounge_ledger::domain::account::{Amount, Balance};
use lounge_ledger::domain::ports::ManualClock;
use lounge_ledger::error::LedgerError;
use lounge_ledger::infrastructure::in_memory::InMemoryAccountStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn shared_engine() -> (Arc<LedgerEngine>, ManualClock) {
    let mut config = Config::default();
    config.admins.insert("admin".to_string());

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap());
    let engine = LedgerEngine::new(
        Box::new(InMemoryAccountStore::new()),
        Box::new(clock.clone()),
        config,
    );
    (Arc::new(engine), clock)
}

#[tokio::test]
async fn test_simultaneous_check_outs_settle_exactly_once() {
    let (engine, clock) = shared_engine();

    // Balance covers exactly one fee.
    engine
        .credit("admin", "42", Amount::new(dec!(6)).unwrap())
        .await
        .unwrap();
    engine.check_in("42").await.unwrap();
    clock.advance_secs(2000);

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.check_out("42").await }
    });
    let second = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.check_out("42").await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one check-out may settle");

    // The loser observed a serialized, consistent state: either the session
    // was already closed or the remaining balance no longer covered the fee.
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser,
        Err(LedgerError::NotCheckedIn) | Err(LedgerError::InsufficientBalance { .. })
    ));

    // Debited once, never twice.
    match engine.info("42").await.unwrap() {
        Outcome::Info(account) => {
            assert_eq!(account.balance, Balance::ZERO);
            assert_eq!(account.today_consumption, Balance::new(dec!(6.0)));
            assert_eq!(account.total_time, 2000);
            assert_eq!(account.checked_in_at, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_simultaneous_check_ins_open_one_session() {
    let (engine, _clock) = shared_engine();

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.check_in("42").await }
    });
    let second = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.check_in("42").await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(LedgerError::AlreadyCheckedIn))));
}

#[tokio::test]
async fn test_interleaved_callers_keep_accounts_consistent() {
    let (engine, clock) = shared_engine();

    for identity in ["a", "b", "c", "d"] {
        engine
            .credit("admin", identity, Amount::new(dec!(10)).unwrap())
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for identity in ["a", "b", "c", "d"] {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.check_in(identity).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    clock.advance_secs(2000);

    let mut handles = Vec::new();
    for identity in ["a", "b", "c", "d"] {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.check_out(identity).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for identity in ["a", "b", "c", "d"] {
        match engine.info(identity).await.unwrap() {
            Outcome::Info(account) => {
                assert_eq!(account.balance, Balance::new(dec!(4.0)));
                assert_eq!(account.total_time, 2000);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
