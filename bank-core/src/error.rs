//! Error types for the bank ledger

use crate::types::{AccountNumber, CustomerId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Account creation requested for a number that is already taken
    #[error("Account {0} already exists")]
    AccountAlreadyExists(AccountNumber),

    /// Referenced account number does not resolve
    #[error("Account {0} not found")]
    AccountNotFound(AccountNumber),

    /// Referenced customer does not resolve
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// Acting customer is not an owner of the account being debited
    #[error("Customer {customer} is not authorized on account {account}")]
    Unauthorized {
        /// Customer that attempted the debit
        customer: CustomerId,
        /// Account the debit was attempted on
        account: AccountNumber,
    },

    /// Converted withdrawal amount exceeds the current balance
    #[error(
        "Insufficient funds on account {account}: requested {requested}, available {available}"
    )]
    InsufficientFunds {
        /// Account the withdrawal was attempted on
        account: AccountNumber,
        /// Requested amount, in the account currency
        requested: Decimal,
        /// Current balance
        available: Decimal,
    },

    /// Unrecognized operation type string
    #[error("Invalid transaction type: {0:?}")]
    InvalidTransactionType(String),

    /// Requested amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Unknown currency code, or a currency with a non-positive rate
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Transfer requested without a destination account
    #[error("Transfer from account {0} has no destination account")]
    NoDestinationAccount(AccountNumber),

    /// Account creation input violation (no owners, negative initial deposit)
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Storage error (persistence collaborator)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Storage(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = Error::Unauthorized {
            customer: CustomerId::new(504),
            account: AccountNumber::new(2001),
        };
        assert_eq!(
            err.to_string(),
            "Customer C504 is not authorized on account 2001"
        );

        let err = Error::InsufficientFunds {
            account: AccountNumber::new(1234),
            requested: dec!(10000.00),
            available: dec!(500.00),
        };
        assert!(err.to_string().contains("requested 10000.00"));
        assert!(err.to_string().contains("available 500.00"));
    }

    #[test]
    fn test_invalid_type_preserves_input() {
        let err = Error::InvalidTransactionType("checkcashing".to_string());
        assert!(err.to_string().contains("checkcashing"));
    }
}
