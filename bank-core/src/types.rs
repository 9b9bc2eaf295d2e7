//! Core identifier and request types for the bank ledger
//!
//! All types are designed for:
//! - Exact arithmetic (Decimal for money)
//! - Memory safety (no unsafe code)
//! - Serde serialization at the collaborator boundary

use crate::error::Error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External account identifier, unique and immutable after creation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountNumber(u32);

impl AccountNumber {
    /// Create new account number
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Get as integer
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External customer identifier, unique across the system
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CustomerId(u32);

impl CustomerId {
    /// Create new customer ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get as integer
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// A bank customer, referenced (not owned) by account owner sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Externally supplied identifier
    pub id: CustomerId,

    /// Display name; updated on upsert
    pub name: String,
}

impl Customer {
    /// Create new customer
    pub fn new(id: CustomerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Operation kind, validated once at the orchestrator boundary
///
/// Wire requests carry a free-form type string; it is parsed into this
/// closed set exactly once, so internal dispatch is exhaustive matching
/// rather than string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Credit the source account (no authorization required)
    Deposit,
    /// Debit the source account (owner only)
    Withdraw,
    /// Debit the source account and credit the destination account
    Transfer,
}

impl FromStr for Operation {
    type Err = Error;

    /// Parse from string, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deposit" => Ok(Operation::Deposit),
            "withdraw" => Ok(Operation::Withdraw),
            "transfer" => Ok(Operation::Transfer),
            _ => Err(Error::InvalidTransactionType(s.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit => write!(f, "deposit"),
            Operation::Withdraw => write!(f, "withdraw"),
            Operation::Transfer => write!(f, "transfer"),
        }
    }
}

/// A transaction request as received from the presentation collaborator
///
/// The operation type and currency code arrive as raw strings and are
/// validated by [`crate::Bank::perform_transaction`] before any entity
/// is mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Operation type string ("deposit", "withdraw", "transfer")
    pub operation: String,

    /// Requested amount, denominated in `currency`
    pub amount: Decimal,

    /// Acting customer (upserted before the operation runs)
    pub customer: Customer,

    /// Free-text description, enriched into the transaction record
    pub description: String,

    /// Source account
    pub account: AccountNumber,

    /// Currency code of `amount`; `None` means the base currency
    pub currency: Option<String>,

    /// Destination account, required for transfers
    pub destination: Option<AccountNumber>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse_case_insensitive() {
        assert_eq!("deposit".parse::<Operation>().unwrap(), Operation::Deposit);
        assert_eq!("WITHDRAW".parse::<Operation>().unwrap(), Operation::Withdraw);
        assert_eq!("Transfer".parse::<Operation>().unwrap(), Operation::Transfer);
    }

    #[test]
    fn test_operation_parse_unknown() {
        let err = "checkcashing".parse::<Operation>().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransactionType("checkcashing".to_string())
        );
    }

    #[test]
    fn test_customer_id_display() {
        assert_eq!(CustomerId::new(777).to_string(), "C777");
    }

    #[test]
    fn test_account_number_ordering() {
        assert!(AccountNumber::new(1010) < AccountNumber::new(5500));
    }
}
