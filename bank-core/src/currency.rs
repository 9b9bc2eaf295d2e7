//! Currencies, money, and fixed-rate conversion
//!
//! Every currency carries an integer `rate`: how many units of that
//! currency equal one unit of an implicit common base. Conversion between
//! two currencies is the rate ratio, computed with exact decimal
//! arithmetic (multiply first, divide last) so chained conversions do not
//! drift.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An immutable reference currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    name: String,
    rate: u32,
}

impl Currency {
    /// Create a currency, rejecting non-positive rates
    pub fn new(code: impl Into<String>, name: impl Into<String>, rate: u32) -> Result<Self> {
        let code = code.into();
        if rate == 0 {
            return Err(Error::InvalidCurrency(format!(
                "{code}: rate must be positive"
            )));
        }
        Ok(Self {
            code,
            name: name.into(),
            rate,
        })
    }

    /// Short unique code, e.g. "CAD"
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units of this currency per base unit
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Convert an amount in this currency into `target`
    ///
    /// `amount * self.rate / target.rate`, multiplication first to keep
    /// full decimal precision until the final division. Same-currency
    /// conversion returns the amount unchanged.
    pub fn convert(&self, amount: Decimal, target: &Currency) -> Decimal {
        if self.code == target.code {
            return amount;
        }
        amount * Decimal::from(self.rate) / Decimal::from(target.rate)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// An amount paired with its currency; never exists without one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount
    pub value: Decimal,

    /// Currency the amount is denominated in
    pub currency: Currency,
}

impl Money {
    /// Create new money value
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// This amount expressed in `target` currency
    pub fn in_currency(&self, target: &Currency) -> Decimal {
        self.currency.convert(self.value, target)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency.code)
    }
}

/// Immutable catalog mapping currency codes to currencies
///
/// Built once at startup and threaded through the orchestrator; the
/// catalog is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    currencies: BTreeMap<String, Currency>,
    base: String,
}

impl CurrencyCatalog {
    /// Build a catalog from a currency list and a base currency code
    ///
    /// The base currency must be present in the list.
    pub fn new(currencies: impl IntoIterator<Item = Currency>, base: &str) -> Result<Self> {
        let currencies: BTreeMap<String, Currency> = currencies
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();

        if !currencies.contains_key(base) {
            return Err(Error::Config(format!(
                "base currency {base} is not in the catalog"
            )));
        }

        Ok(Self {
            currencies,
            base: base.to_string(),
        })
    }

    /// Look up a currency by code
    pub fn get(&self, code: &str) -> Result<&Currency> {
        self.currencies
            .get(code)
            .ok_or_else(|| Error::InvalidCurrency(code.to_string()))
    }

    /// The base currency
    pub fn base(&self) -> &Currency {
        // Presence is checked at construction
        &self.currencies[&self.base]
    }

    /// All currencies in the catalog, ordered by code
    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    /// Number of currencies in the catalog
    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}
