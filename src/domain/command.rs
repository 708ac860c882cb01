use crate::domain::account::{Amount, DiscountRate};
use crate::error::{LedgerError, Result};

/// A parsed command, ready for the engine to execute.
///
/// Parsing validates argument shape and value ranges up front so that no
/// malformed input ever reaches a store write.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CheckIn,
    CheckOut,
    Info,
    Balance,
    ActiveList,
    Rank,
    Credit { target: String, amount: Amount },
    Debit { target: String, amount: Amount },
    SetDiscount { target: String, rate: DiscountRate },
    Help,
}

impl Command {
    /// Parses a command name plus its whitespace-separated argument string.
    ///
    /// Argument-free commands tolerate trailing tokens; the two-argument admin
    /// commands require exactly their target and value.
    pub fn parse(name: &str, args: &str) -> Result<Self> {
        let tokens: Vec<&str> = args.split_whitespace().collect();

        match name {
            "check-in" => Ok(Self::CheckIn),
            "check-out" => Ok(Self::CheckOut),
            "info" => Ok(Self::Info),
            "balance" => Ok(Self::Balance),
            "active-list" => Ok(Self::ActiveList),
            "rank" => Ok(Self::Rank),
            "help" => Ok(Self::Help),
            "credit" => {
                let (target, amount) = Self::target_and_value(&tokens, "credit", "amount")?;
                Ok(Self::Credit {
                    target,
                    amount: amount.parse()?,
                })
            }
            "debit" => {
                let (target, amount) = Self::target_and_value(&tokens, "debit", "amount")?;
                Ok(Self::Debit {
                    target,
                    amount: amount.parse()?,
                })
            }
            "set-discount" => {
                let (target, rate) = Self::target_and_value(&tokens, "set-discount", "rate")?;
                Ok(Self::SetDiscount {
                    target,
                    rate: rate.parse()?,
                })
            }
            other => Err(LedgerError::UnknownCommand(other.to_string())),
        }
    }

    fn target_and_value<'a>(
        tokens: &[&'a str],
        name: &str,
        value_name: &str,
    ) -> Result<(String, &'a str)> {
        match tokens {
            &[target, value] => Ok((target.to_string(), value)),
            _ => Err(LedgerError::Validation(format!(
                "usage: {name} <identity> <{value_name}>"
            ))),
        }
    }
}
