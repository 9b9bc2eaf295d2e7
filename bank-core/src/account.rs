//! Account entity and its append-only transaction ledger
//!
//! An account is a state machine: deposits and withdrawals append
//! immutable [`Transaction`] records and move the balance. The balance is
//! always derivable from the transaction history, and every amount is
//! converted into the account's settlement currency at append time.

use crate::currency::{Currency, Money};
use crate::error::{Error, Result};
use crate::types::{AccountNumber, Customer, CustomerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Balance effect of a transaction
///
/// The reference system called these `Debit`/`Credit` with inverted
/// banking polarity; the neutral names keep the identical semantics
/// without the confusing terminology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Balance-increasing entry
    Inflow,
    /// Balance-decreasing entry
    Outflow,
}

impl Direction {
    /// Sign applied to the amount when deriving the balance
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Inflow => Decimal::ONE,
            Direction::Outflow => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Append-only ledger entry, owned exclusively by its account
///
/// Once appended a transaction is never modified or removed; it is the
/// durable record from which the balance is derivable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique record ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Creation instant (UTC)
    pub timestamp: DateTime<Utc>,

    /// Amount in the owning account's currency, converted at creation
    pub amount: Money,

    /// Balance effect
    pub direction: Direction,

    /// Free text, enriched with the original requested amount/currency
    pub description: String,
}

impl Transaction {
    /// Signed balance effect of this entry
    pub fn signed_amount(&self) -> Decimal {
        self.direction.sign() * self.amount.value
    }
}

/// A balance-bearing entity with one settlement currency and one or more
/// owning customers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    number: AccountNumber,
    currency: Currency,
    balance: Decimal,
    owners: BTreeSet<CustomerId>,
    transactions: Vec<Transaction>,
}

impl Account {
    /// Open an account with an initial deposit
    ///
    /// Requires at least one owner and a non-negative initial amount;
    /// the opening balance is recorded as an ordinary deposit
    /// transaction.
    pub fn open(
        number: AccountNumber,
        currency: Currency,
        initial: Money,
        owners: impl IntoIterator<Item = CustomerId>,
    ) -> Result<Self> {
        let owners: BTreeSet<CustomerId> = owners.into_iter().collect();
        if owners.is_empty() {
            return Err(Error::InvalidAccount(format!(
                "account {number} must have at least one owner"
            )));
        }
        if initial.value < Decimal::ZERO {
            return Err(Error::InvalidAccount(format!(
                "account {number} initial deposit {initial} is negative"
            )));
        }

        let mut account = Self {
            number,
            currency,
            balance: Decimal::ZERO,
            owners,
            transactions: Vec::new(),
        };
        account.deposit(initial, "Initial deposit");
        Ok(account)
    }

    /// Account number
    pub fn number(&self) -> AccountNumber {
        self.number
    }

    /// Settlement currency, fixed at creation
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Current balance, in the settlement currency
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Owning customers
    pub fn owners(&self) -> &BTreeSet<CustomerId> {
        &self.owners
    }

    /// Whether the given customer may debit this account
    pub fn is_owner(&self, customer: CustomerId) -> bool {
        self.owners.contains(&customer)
    }

    /// Transaction history, oldest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Balance recomputed from the transaction history
    ///
    /// Always equals [`Account::balance`]; exposed so callers can audit
    /// the invariant.
    pub fn derived_balance(&self) -> Decimal {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }

    /// Deposit an amount into this account
    ///
    /// The amount is converted into the account currency and appended as
    /// an inflow. Deposits carry no authorization check: any caller may
    /// credit any account.
    pub fn deposit(&mut self, amount: Money, description: &str) -> Transaction {
        let transaction = self.record(&amount, Direction::Inflow, description);
        self.balance += transaction.amount.value;
        self.transactions.push(transaction.clone());

        tracing::debug!(
            account = %self.number,
            amount = %transaction.amount,
            balance = %self.balance,
            "Deposit applied"
        );

        transaction
    }

    /// Withdraw an amount from this account
    ///
    /// The acting customer must be an owner, and the converted amount
    /// must not exceed the balance. Authorization is checked before
    /// sufficiency so an unauthorized actor never learns whether the
    /// funds were there. On failure the account is left untouched.
    pub fn withdraw(
        &mut self,
        amount: Money,
        acting: &Customer,
        description: &str,
    ) -> Result<Transaction> {
        if !self.is_owner(acting.id) {
            return Err(Error::Unauthorized {
                customer: acting.id,
                account: self.number,
            });
        }

        let transaction = self.record(&amount, Direction::Outflow, description);
        if transaction.amount.value > self.balance {
            return Err(Error::InsufficientFunds {
                account: self.number,
                requested: transaction.amount.value,
                available: self.balance,
            });
        }

        self.balance -= transaction.amount.value;
        self.transactions.push(transaction.clone());

        tracing::debug!(
            account = %self.number,
            customer = %acting.id,
            amount = %transaction.amount,
            balance = %self.balance,
            "Withdrawal applied"
        );

        Ok(transaction)
    }

    /// Build a candidate transaction in the account currency
    ///
    /// Conversion happens here, at creation time; the description keeps
    /// the original requested amount and currency for auditability.
    fn record(&self, amount: &Money, direction: Direction, description: &str) -> Transaction {
        let converted = amount.in_currency(&self.currency);
        Transaction {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            amount: Money::new(converted, self.currency.clone()),
            direction,
            description: format!("{description} ({} {})", amount.value, amount.currency.code()),
        }
    }
}
