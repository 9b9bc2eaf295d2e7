//! Persistence collaborator boundary
//!
//! The ledger core never talks to a datastore directly; it consumes this
//! narrow trait. [`MemoryStore`] is the reference implementation used in
//! tests and embeddings. Real deployments supply their own implementation
//! (relational, document, whatever) behind the same trait.
//!
//! Retries, if any, belong to the implementation; the core treats every
//! call as a synchronous dependency that either succeeds or fails.

use crate::account::Account;
use crate::currency::Currency;
use crate::error::Result;
use crate::types::{AccountNumber, Customer, CustomerId};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Persistence collaborator for accounts, customers, and currencies
pub trait Storage: Send + Sync {
    /// Find an account by its external number
    fn find_account(&self, number: AccountNumber) -> Result<Option<Account>>;

    /// All accounts, ordered by account number
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Upsert an account, preserving identity and full history
    fn save_account(&self, account: &Account) -> Result<()>;

    /// Upsert several accounts so that readers observe all or none
    ///
    /// Transfers mutate two accounts; a reader must never see one leg
    /// applied without the other.
    fn save_accounts(&self, accounts: &[&Account]) -> Result<()>;

    /// Find a customer by id
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// All customers, ordered by id
    fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Upsert a customer, keyed by customer id
    fn save_customer(&self, customer: &Customer) -> Result<()>;

    /// The seeded currency catalog
    fn list_currencies(&self) -> Result<Vec<Currency>>;

    /// Seed a currency; existing codes are left untouched
    fn save_currency(&self, currency: &Currency) -> Result<()>;
}

#[derive(Debug, Default)]
struct Inner {
    accounts: BTreeMap<AccountNumber, Account>,
    customers: BTreeMap<CustomerId, Customer>,
    currencies: BTreeMap<String, Currency>,
}

/// In-memory storage, single write lock around all tables
///
/// The coarse lock is what makes `save_accounts` atomic to readers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn find_account(&self, number: AccountNumber) -> Result<Option<Account>> {
        Ok(self.inner.read().accounts.get(&number).cloned())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.inner.read().accounts.values().cloned().collect())
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        self.inner
            .write()
            .accounts
            .insert(account.number(), account.clone());
        Ok(())
    }

    fn save_accounts(&self, accounts: &[&Account]) -> Result<()> {
        let mut inner = self.inner.write();
        for account in accounts {
            inner.accounts.insert(account.number(), (*account).clone());
        }
        Ok(())
    }

    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.inner.read().customers.get(&id).cloned())
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.inner.read().customers.values().cloned().collect())
    }

    fn save_customer(&self, customer: &Customer) -> Result<()> {
        self.inner
            .write()
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    fn list_currencies(&self) -> Result<Vec<Currency>> {
        Ok(self.inner.read().currencies.values().cloned().collect())
    }

    fn save_currency(&self, currency: &Currency) -> Result<()> {
        let mut inner = self.inner.write();
        inner
            .currencies
            .entry(currency.code().to_string())
            .or_insert_with(|| currency.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Money;
    use rust_decimal_macros::dec;

    fn cad() -> Currency {
        Currency::new("CAD", "Canadian Dollar", 100).unwrap()
    }

    fn test_account(number: u32) -> Account {
        Account::open(
            AccountNumber::new(number),
            cad(),
            Money::new(dec!(100.00), cad()),
            [CustomerId::new(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_account_round_trip() {
        let store = MemoryStore::new();
        let account = test_account(1234);

        store.save_account(&account).unwrap();

        let found = store.find_account(AccountNumber::new(1234)).unwrap();
        assert_eq!(found, Some(account));
        assert!(store.find_account(AccountNumber::new(9999)).unwrap().is_none());
    }

    #[test]
    fn test_list_accounts_ordered() {
        let store = MemoryStore::new();
        store.save_account(&test_account(5500)).unwrap();
        store.save_account(&test_account(1010)).unwrap();

        let numbers: Vec<u32> = store
            .list_accounts()
            .unwrap()
            .iter()
            .map(|a| a.number().as_u32())
            .collect();
        assert_eq!(numbers, vec![1010, 5500]);
    }

    #[test]
    fn test_customer_upsert() {
        let store = MemoryStore::new();
        let id = CustomerId::new(77);

        store.save_customer(&Customer::new(id, "John Smith")).unwrap();
        store.save_customer(&Customer::new(id, "John A. Smith")).unwrap();

        let customers = store.list_customers().unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "John A. Smith");
    }

    #[test]
    fn test_currency_seed_is_idempotent() {
        let store = MemoryStore::new();
        store.save_currency(&cad()).unwrap();

        // Re-seeding with a different rate must not clobber the original.
        let other = Currency::new("CAD", "Canadian Dollar", 999).unwrap();
        store.save_currency(&other).unwrap();

        let currencies = store.list_currencies().unwrap();
        assert_eq!(currencies.len(), 1);
        assert_eq!(currencies[0].rate(), 100);
    }

    #[test]
    fn test_save_accounts_multi() {
        let store = MemoryStore::new();
        let a = test_account(1010);
        let b = test_account(5500);

        store.save_accounts(&[&a, &b]).unwrap();
        assert_eq!(store.list_accounts().unwrap().len(), 2);
    }
}
