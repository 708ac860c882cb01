use crate::domain::account::Balance;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("already checked in")]
    AlreadyCheckedIn,
    #[error("not checked in")]
    NotCheckedIn,
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Balance, available: Balance },
    #[error("permission denied")]
    PermissionDenied,
    #[error("no account for identity {0}")]
    AccountNotFound(String),
    #[error("caller identity could not be determined")]
    EmptyIdentity,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    Validation(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
