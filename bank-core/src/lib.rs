//! WorldWide Bank Ledger Core
//!
//! Tracks monetary accounts, applies deposits, withdrawals, and
//! transfers, and enforces the correctness invariants: no overdrafts,
//! only owners may debit, all amounts normalized into the account
//! currency via fixed integer exchange rates.
//!
//! # Architecture
//!
//! - **Append-only ledger**: every balance is derivable from its
//!   account's immutable transaction history
//! - **Per-account serialization**: mutating operations take a
//!   per-account lock, so lost-update races cannot occur
//! - **Exact arithmetic**: `rust_decimal` everywhere money is touched
//! - **Narrow persistence boundary**: the [`Storage`] trait is the only
//!   collaborator; HTTP/ORM plumbing lives outside this crate
//!
//! # Invariants
//!
//! - Balance never goes negative; rejected debits mutate nothing
//! - Authorization is checked before sufficiency on every debit
//! - Transfers are atomic: both legs become visible or neither does

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod account;
pub mod bank;
pub mod config;
pub mod currency;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use account::{Account, Direction, Transaction};
pub use bank::Bank;
pub use config::Config;
pub use currency::{Currency, CurrencyCatalog, Money};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use storage::{MemoryStore, Storage};
pub use types::{AccountNumber, Customer, CustomerId, Operation, TransactionRequest};
