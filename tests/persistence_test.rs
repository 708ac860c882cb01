mod common;

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_sqlite_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");

    // 1. First run: credit an account.
    let events1 = dir.path().join("events1.csv");
    common::write_events(&events1, &[("9001", "credit", "42 100")]).unwrap();

    let mut cmd1 = Command::new(cargo_bin!("lounge-ledger"));
    cmd1.arg(&events1)
        .arg("--db-path")
        .arg(&db_path)
        .arg("--admin")
        .arg("9001");

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("new balance 100.00"));

    // 2. Second run: the balance must have been recovered from disk.
    let events2 = dir.path().join("events2.csv");
    common::write_events(&events2, &[("42", "balance", "")]).unwrap();

    let mut cmd2 = Command::new(cargo_bin!("lounge-ledger"));
    cmd2.arg(&events2).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("Balance for 42: 100.00"));
}

#[test]
fn test_discount_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");

    let events1 = dir.path().join("events1.csv");
    common::write_events(&events1, &[("9001", "set-discount", "42 50%")]).unwrap();

    let mut cmd1 = Command::new(cargo_bin!("lounge-ledger"));
    cmd1.arg(&events1)
        .arg("--db-path")
        .arg(&db_path)
        .arg("--admin")
        .arg("9001");
    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());

    let events2 = dir.path().join("events2.csv");
    common::write_events(&events2, &[("42", "info", "")]).unwrap();

    let mut cmd2 = Command::new(cargo_bin!("lounge-ledger"));
    cmd2.arg(&events2).arg("--db-path").arg(&db_path);
    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("50% discount active"));
}
