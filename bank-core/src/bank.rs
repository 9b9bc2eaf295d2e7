//! Main bank orchestration layer
//!
//! This module ties together the currency catalog, account entities, and
//! the persistence collaborator into the single entry point for account
//! creation, customer upserts, and transaction processing.
//!
//! # Example
//!
//! ```
//! use bank_core::{Bank, Config, Customer, CustomerId, MemoryStore};
//! use rust_decimal::Decimal;
//!
//! fn main() -> bank_core::Result<()> {
//!     let bank = Bank::open(Config::default(), MemoryStore::new())?;
//!
//!     let owner = bank.upsert_customer(Customer::new(CustomerId::new(777), "John Smith"))?;
//!     let account = bank.create_account(
//!         bank_core::AccountNumber::new(1234),
//!         "CAD",
//!         Decimal::from(100),
//!         &[owner.id],
//!     )?;
//!     assert_eq!(account.balance(), Decimal::from(100));
//!     Ok(())
//! }
//! ```

use crate::account::Account;
use crate::config::Config;
use crate::currency::{Currency, CurrencyCatalog, Money};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::storage::Storage;
use crate::types::{AccountNumber, Customer, CustomerId, Operation, TransactionRequest};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Main bank interface
///
/// Mutating operations are serialized per account through a lock table,
/// so two concurrent withdrawals can never both read a sufficient
/// balance before either commits. Reads go straight to storage.
pub struct Bank<S: Storage> {
    /// Persistence collaborator
    store: S,

    /// Immutable currency catalog, built once at open
    catalog: CurrencyCatalog,

    /// Configuration
    config: Config,

    /// Per-account write locks
    locks: DashMap<AccountNumber, Arc<Mutex<()>>>,

    /// Operation counters
    metrics: Metrics,
}

impl<S: Storage> Bank<S> {
    /// Open the bank with configuration and a persistence collaborator
    ///
    /// Seeds the configured currencies into the store (existing codes are
    /// left untouched), then builds the catalog from what the store
    /// holds, so every ledger instance sharing the store converts with
    /// the same rates.
    pub fn open(config: Config, store: S) -> Result<Self> {
        for currency in config.catalog()?.iter() {
            store.save_currency(currency)?;
        }

        let catalog = CurrencyCatalog::new(store.list_currencies()?, &config.base_currency)?;

        info!(
            currencies = catalog.len(),
            base = %catalog.base(),
            "Bank opened"
        );

        Ok(Self {
            store,
            catalog,
            config,
            locks: DashMap::new(),
            metrics: Metrics::default(),
        })
    }

    /// The currency catalog in use
    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }

    /// Operation counters
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Create an account with an initial deposit in its own currency
    ///
    /// Fails with `AccountAlreadyExists` if the number is taken, and with
    /// `CustomerNotFound` if any owner does not resolve. Nothing is
    /// mutated on failure.
    pub fn create_account(
        &self,
        number: AccountNumber,
        currency_code: &str,
        initial_amount: Decimal,
        owners: &[CustomerId],
    ) -> Result<Account> {
        let currency = self.catalog.get(currency_code)?.clone();

        for owner in owners {
            self.resolve_customer(*owner)?;
        }

        let lock = self.account_lock(number);
        let _guard = lock.lock();

        if self.store.find_account(number)?.is_some() {
            return Err(Error::AccountAlreadyExists(number));
        }

        let initial = Money::new(initial_amount, currency.clone());
        let account = Account::open(number, currency, initial, owners.iter().copied())?;
        self.store.save_account(&account)?;
        self.metrics.accounts_created.inc();

        info!(
            account = %number,
            balance = %account.balance(),
            currency = %account.currency(),
            owners = owners.len(),
            "Account created"
        );

        Ok(account)
    }

    /// Fetch an account by number
    pub fn fetch_account(&self, number: AccountNumber) -> Result<Option<Account>> {
        self.store.find_account(number)
    }

    /// All accounts, ordered by account number
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts()
    }

    /// Accounts owned by the given customer
    pub fn accounts_for_customer(&self, customer: CustomerId) -> Result<Vec<Account>> {
        self.resolve_customer(customer)?;
        Ok(self
            .store
            .list_accounts()?
            .into_iter()
            .filter(|account| account.is_owner(customer))
            .collect())
    }

    /// Create or update a customer, keyed by customer id
    pub fn upsert_customer(&self, customer: Customer) -> Result<Customer> {
        let customer = match self.store.find_customer(customer.id)? {
            Some(mut existing) => {
                existing.name = customer.name;
                existing
            }
            None => customer,
        };

        self.store.save_customer(&customer)?;
        Ok(customer)
    }

    /// All customers, ordered by id
    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        self.store.list_customers()
    }

    /// Perform a deposit, withdrawal, or transfer
    ///
    /// The sole mutating entry point for transactions. Returns the
    /// updated source account; any failure leaves every involved account
    /// exactly as it was.
    pub fn perform_transaction(&self, request: TransactionRequest) -> Result<Account> {
        let result = self.execute(request);
        if result.is_err() {
            self.metrics.rejected.inc();
        }
        result
    }

    fn execute(&self, request: TransactionRequest) -> Result<Account> {
        // Validate the operation type and amount once, at the edge;
        // everything past this point dispatches on the closed enum and
        // moves strictly positive money.
        let operation: Operation = request.operation.parse()?;
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(request.amount));
        }

        let currency = self.resolve_currency(request.currency.as_deref())?;
        let amount = Money::new(request.amount, currency);

        info!(
            %operation,
            account = %request.account,
            customer = %request.customer.id,
            amount = %amount,
            "Performing transaction"
        );

        // The acting customer is upserted inside each branch, after every
        // account reference has resolved: a failed request must leave all
        // involved entities, the customer included, untouched.
        match operation {
            Operation::Deposit => self.deposit(
                request.account,
                amount,
                request.customer,
                &request.description,
            ),
            Operation::Withdraw => self.withdraw(
                request.account,
                amount,
                request.customer,
                &request.description,
            ),
            Operation::Transfer => {
                let destination = request
                    .destination
                    .ok_or(Error::NoDestinationAccount(request.account))?;
                self.transfer(
                    request.account,
                    destination,
                    amount,
                    request.customer,
                    &request.description,
                )
            }
        }
    }

    fn deposit(
        &self,
        number: AccountNumber,
        amount: Money,
        customer: Customer,
        description: &str,
    ) -> Result<Account> {
        let lock = self.account_lock(number);
        let _guard = lock.lock();

        let mut account = self.load_account(number)?;
        self.upsert_customer(customer)?;
        account.deposit(amount, description);
        self.store.save_account(&account)?;
        self.metrics.deposits.inc();

        Ok(account)
    }

    fn withdraw(
        &self,
        number: AccountNumber,
        amount: Money,
        customer: Customer,
        description: &str,
    ) -> Result<Account> {
        let lock = self.account_lock(number);
        let _guard = lock.lock();

        let mut account = self.load_account(number)?;
        account.withdraw(amount, &customer, description)?;
        self.upsert_customer(customer)?;
        self.store.save_account(&account)?;
        self.metrics.withdrawals.inc();

        Ok(account)
    }

    fn transfer(
        &self,
        source: AccountNumber,
        destination: AccountNumber,
        amount: Money,
        customer: Customer,
        description: &str,
    ) -> Result<Account> {
        if source == destination {
            return self.self_transfer(source, amount, customer, description);
        }

        // Lock both accounts in ascending number order to rule out
        // lock-order deadlocks between concurrent opposite transfers.
        let (low, high) = if source < destination {
            (source, destination)
        } else {
            (destination, source)
        };
        let low_lock = self.account_lock(low);
        let high_lock = self.account_lock(high);
        let _low_guard = low_lock.lock();
        let _high_guard = high_lock.lock();

        // Resolve both accounts before mutating either; an absent
        // destination aborts the whole operation.
        let mut from = self.load_account(source)?;
        let mut to = self.load_account(destination)?;

        // Debit leg first. If it fails, the credit leg never runs.
        from.withdraw(amount.clone(), &customer, description)?;
        self.upsert_customer(customer)?;

        // Each account converts the original pre-conversion amount into
        // its own currency independently.
        to.deposit(amount, description);

        // Both legs or neither become visible to readers.
        self.store.save_accounts(&[&from, &to])?;
        self.metrics.transfers.inc();

        info!(
            source = %source,
            destination = %destination,
            source_balance = %from.balance(),
            destination_balance = %to.balance(),
            "Transfer completed"
        );

        Ok(from)
    }

    /// Transfer where source and destination are the same account
    ///
    /// Takes one lock and applies both legs to a single instance; the
    /// net balance effect is zero but both ledger entries are recorded.
    fn self_transfer(
        &self,
        number: AccountNumber,
        amount: Money,
        customer: Customer,
        description: &str,
    ) -> Result<Account> {
        let lock = self.account_lock(number);
        let _guard = lock.lock();

        let mut account = self.load_account(number)?;
        account.withdraw(amount.clone(), &customer, description)?;
        self.upsert_customer(customer)?;
        account.deposit(amount, description);
        self.store.save_account(&account)?;
        self.metrics.transfers.inc();

        Ok(account)
    }

    fn load_account(&self, number: AccountNumber) -> Result<Account> {
        self.store
            .find_account(number)?
            .ok_or(Error::AccountNotFound(number))
    }

    fn resolve_customer(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .find_customer(id)?
            .ok_or(Error::CustomerNotFound(id))
    }

    fn resolve_currency(&self, code: Option<&str>) -> Result<Currency> {
        let Some(code) = code else {
            return Ok(self.catalog.base().clone());
        };

        match self.catalog.get(code) {
            Ok(currency) => Ok(currency.clone()),
            Err(_) if self.config.fallback_to_base => {
                warn!(code, "Unknown currency code, falling back to base currency");
                Ok(self.catalog.base().clone())
            }
            Err(err) => Err(err),
        }
    }

    fn account_lock(&self, number: AccountNumber) -> Arc<Mutex<()>> {
        self.locks.entry(number).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rust_decimal_macros::dec;

    fn test_bank() -> Bank<MemoryStore> {
        Bank::open(Config::default(), MemoryStore::new()).unwrap()
    }

    fn customer(bank: &Bank<MemoryStore>, id: u32, name: &str) -> Customer {
        bank.upsert_customer(Customer::new(CustomerId::new(id), name))
            .unwrap()
    }

    fn request(
        operation: &str,
        amount: Decimal,
        customer: &Customer,
        account: u32,
    ) -> TransactionRequest {
        TransactionRequest {
            operation: operation.to_string(),
            amount,
            customer: customer.clone(),
            description: "test".to_string(),
            account: AccountNumber::new(account),
            currency: None,
            destination: None,
        }
    }

    #[test]
    fn test_create_account_duplicate_rejected() {
        let bank = test_bank();
        let owner = customer(&bank, 77, "John Smith");

        bank.create_account(AccountNumber::new(654), "CAD", dec!(500.00), &[owner.id])
            .unwrap();

        let err = bank
            .create_account(AccountNumber::new(654), "CAD", dec!(9999.00), &[owner.id])
            .unwrap_err();
        assert_eq!(err, Error::AccountAlreadyExists(AccountNumber::new(654)));

        // Pre-existing account untouched by the failed attempt.
        let account = bank.fetch_account(AccountNumber::new(654)).unwrap().unwrap();
        assert_eq!(account.balance(), dec!(500.00));
        assert_eq!(account.transactions().len(), 1);
    }

    #[test]
    fn test_create_account_unknown_owner() {
        let bank = test_bank();
        let err = bank
            .create_account(
                AccountNumber::new(1),
                "CAD",
                dec!(10.00),
                &[CustomerId::new(42)],
            )
            .unwrap_err();
        assert_eq!(err, Error::CustomerNotFound(CustomerId::new(42)));
        assert!(bank.fetch_account(AccountNumber::new(1)).unwrap().is_none());
    }

    #[test]
    fn test_unknown_currency_strict_by_default() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let mut req = request("deposit", dec!(50.00), &owner, 10);
        req.currency = Some("XYZ".to_string());

        let err = bank.perform_transaction(req).unwrap_err();
        assert_eq!(err, Error::InvalidCurrency("XYZ".to_string()));
        assert_eq!(
            bank.fetch_account(AccountNumber::new(10))
                .unwrap()
                .unwrap()
                .balance(),
            dec!(100.00)
        );
    }

    #[test]
    fn test_unknown_currency_fallback_opt_in() {
        let config = Config {
            fallback_to_base: true,
            ..Config::default()
        };
        let bank = Bank::open(config, MemoryStore::new()).unwrap();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let mut req = request("deposit", dec!(50.00), &owner, 10);
        req.currency = Some("XYZ".to_string());

        // Treated as the base currency, reference behavior.
        let account = bank.perform_transaction(req).unwrap();
        assert_eq!(account.balance(), dec!(150.00));
    }

    #[test]
    fn test_invalid_operation_type() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let err = bank
            .perform_transaction(request("checkcashing", dec!(50.00), &owner, 10))
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransactionType("checkcashing".to_string())
        );
        assert_eq!(bank.metrics().rejected.get(), 1);
    }

    #[test]
    fn test_negative_deposit_rejected() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let err = bank
            .perform_transaction(request("deposit", dec!(-500.00), &owner, 10))
            .unwrap_err();
        assert_eq!(err, Error::InvalidAmount(dec!(-500.00)));
        assert_eq!(
            bank.fetch_account(AccountNumber::new(10))
                .unwrap()
                .unwrap()
                .balance(),
            dec!(100.00)
        );
    }

    #[test]
    fn test_negative_withdrawal_rejected() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        // A negative debit would slip past the sufficiency check and
        // credit the account instead.
        let err = bank
            .perform_transaction(request("withdraw", dec!(-500.00), &owner, 10))
            .unwrap_err();
        assert_eq!(err, Error::InvalidAmount(dec!(-500.00)));

        let account = bank.fetch_account(AccountNumber::new(10)).unwrap().unwrap();
        assert_eq!(account.balance(), dec!(100.00));
        assert_eq!(account.transactions().len(), 1);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let err = bank
            .perform_transaction(request("deposit", Decimal::ZERO, &owner, 10))
            .unwrap_err();
        assert_eq!(err, Error::InvalidAmount(Decimal::ZERO));
    }

    #[test]
    fn test_transfer_requires_destination() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let err = bank
            .perform_transaction(request("transfer", dec!(50.00), &owner, 10))
            .unwrap_err();
        assert_eq!(err, Error::NoDestinationAccount(AccountNumber::new(10)));
    }

    #[test]
    fn test_transfer_missing_destination_aborts_before_mutation() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let mut req = request("transfer", dec!(50.00), &owner, 10);
        req.destination = Some(AccountNumber::new(9999));

        let err = bank.perform_transaction(req).unwrap_err();
        assert_eq!(err, Error::AccountNotFound(AccountNumber::new(9999)));
        assert_eq!(
            bank.fetch_account(AccountNumber::new(10))
                .unwrap()
                .unwrap()
                .balance(),
            dec!(100.00)
        );
    }

    #[test]
    fn test_failed_withdrawal_leg_leaves_destination_untouched() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();
        bank.create_account(AccountNumber::new(20), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let mut req = request("transfer", dec!(5000.00), &owner, 10);
        req.destination = Some(AccountNumber::new(20));

        let err = bank.perform_transaction(req).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));

        let destination = bank.fetch_account(AccountNumber::new(20)).unwrap().unwrap();
        assert_eq!(destination.balance(), dec!(100.00));
        // No transaction was appended to the destination.
        assert_eq!(destination.transactions().len(), 1);
    }

    #[test]
    fn test_self_transfer_is_balance_neutral() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "A");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        let mut req = request("transfer", dec!(40.00), &owner, 10);
        req.destination = Some(AccountNumber::new(10));

        let account = bank.perform_transaction(req).unwrap();
        assert_eq!(account.balance(), dec!(100.00));
        // Both legs recorded.
        assert_eq!(account.transactions().len(), 3);
    }

    #[test]
    fn test_upsert_customer_updates_name() {
        let bank = test_bank();
        customer(&bank, 77, "John Smith");
        let updated = customer(&bank, 77, "John A. Smith");

        assert_eq!(updated.name, "John A. Smith");
        assert_eq!(bank.list_customers().unwrap().len(), 1);
    }

    #[test]
    fn test_accounts_for_customer() {
        let bank = test_bank();
        let alice = customer(&bank, 1, "Alice");
        let bob = customer(&bank, 2, "Bob");

        bank.create_account(AccountNumber::new(10), "CAD", dec!(1.00), &[alice.id])
            .unwrap();
        bank.create_account(AccountNumber::new(20), "CAD", dec!(1.00), &[alice.id, bob.id])
            .unwrap();
        bank.create_account(AccountNumber::new(30), "CAD", dec!(1.00), &[bob.id])
            .unwrap();

        let accounts = bank.accounts_for_customer(alice.id).unwrap();
        let numbers: Vec<u32> = accounts.iter().map(|a| a.number().as_u32()).collect();
        assert_eq!(numbers, vec![10, 20]);

        let err = bank.accounts_for_customer(CustomerId::new(99)).unwrap_err();
        assert_eq!(err, Error::CustomerNotFound(CustomerId::new(99)));
    }

    #[test]
    fn test_deposit_needs_no_authorization() {
        let bank = test_bank();
        let owner = customer(&bank, 1, "Owner");
        let stranger = customer(&bank, 2, "Stranger");
        bank.create_account(AccountNumber::new(10), "CAD", dec!(100.00), &[owner.id])
            .unwrap();

        // Anyone may credit any account.
        let account = bank
            .perform_transaction(request("deposit", dec!(25.00), &stranger, 10))
            .unwrap();
        assert_eq!(account.balance(), dec!(125.00));
    }
}
